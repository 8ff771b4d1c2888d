/// Keyword sets for classifying a confirmation reply. Membership is
/// case-insensitive substring containment. The sets are not disjoint in
/// composition ("no" appears inside "now"); affirmative is evaluated first,
/// and that ordering is part of the contract.
const AFFIRMATIVE: &[&str] = &["yes", "okay", "go ahead", "send", "sure", "approve"];
const NEGATIVE: &[&str] = &["no", "change", "redo", "edit", "revise"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationIntent {
    Affirmative,
    Negative,
    Unrecognized,
}

pub fn classify_confirmation(message: &str) -> ConfirmationIntent {
    let normalized = message.to_lowercase();

    if AFFIRMATIVE.iter().any(|keyword| normalized.contains(keyword)) {
        return ConfirmationIntent::Affirmative;
    }
    if NEGATIVE.iter().any(|keyword| normalized.contains(keyword)) {
        return ConfirmationIntent::Negative;
    }
    ConfirmationIntent::Unrecognized
}
