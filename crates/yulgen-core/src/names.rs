/// Hands out identifiers that are never reused within one dispenser's lifetime.
#[derive(Debug, Default)]
pub struct NameDispenser {
    next_id: u64,
}

impl NameDispenser {
    pub fn new() -> Self {
        Self::default()
    }

    /// `_1`, `_2`, ...
    pub fn fresh(&mut self) -> String {
        self.fresh_with_prefix("")
    }

    pub fn fresh_with_prefix(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }

    pub fn issued(&self) -> u64 {
        self.next_id
    }
}
