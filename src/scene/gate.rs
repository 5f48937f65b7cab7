//! Card-dismissal gate: counts distinct dismissed cards and opens exactly once
//! when every card is gone.

/// Outcome of a single dismissal event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dismissal {
    /// Unknown card, already dismissed, or gate already open.
    Ignored,
    /// Counted; `remaining` cards still on screen.
    Counted { remaining: usize },
    /// This dismissal was the last one. Reported once per gate.
    Completed,
}

#[derive(Clone, Debug)]
pub struct DismissalGate {
    dismissed: Vec<bool>,
    count: usize,
    opened: bool,
}

impl DismissalGate {
    pub fn new(card_count: usize) -> Self {
        Self {
            dismissed: vec![false; card_count],
            count: 0,
            opened: false,
        }
    }

    pub fn card_count(&self) -> usize {
        self.dismissed.len()
    }

    pub fn dismissed_count(&self) -> usize {
        self.count
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn dismiss(&mut self, card: usize) -> Dismissal {
        match self.dismissed.get_mut(card) {
            Some(slot) if !*slot => *slot = true,
            _ => return Dismissal::Ignored,
        }
        self.count += 1;
        if self.count == self.dismissed.len() && !self.opened {
            self.opened = true;
            Dismissal::Completed
        } else {
            Dismissal::Counted { remaining: self.dismissed.len() - self.count }
        }
    }
}
