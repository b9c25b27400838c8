/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub position: usize,
    pub is_last: bool,
}

impl SessionProgress {
    /// Share of the quiz reached, counting the current question, in whole percent.
    #[must_use]
    pub fn percent_through(&self) -> u8 {
        let reached = u32::try_from(self.position + 1).unwrap_or(u32::MAX);
        let total = u32::try_from(self.total).unwrap_or(u32::MAX);
        quiz_core::scoring::round_percentage(reached, total)
    }
}
