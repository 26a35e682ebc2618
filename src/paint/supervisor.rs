use crate::paint::state::Holds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldChange {
    Engaged,
    Released,
    Unchanged,
}

/// Tracks the verification challenge and toggles the captcha hold.
#[derive(Debug, Clone, Default)]
pub struct InterruptionSupervisor {
    challenge_visible: bool,
}

impl InterruptionSupervisor {
    pub fn challenge_visible(&self) -> bool {
        self.challenge_visible
    }

    /// Records a challenge appearing or disappearing. Holds only change while
    /// a run is active.
    pub fn on_challenge(&mut self, shown: bool, run_active: bool, holds: &mut Holds) -> HoldChange {
        self.challenge_visible = shown;
        if !run_active {
            return HoldChange::Unchanged;
        }
        match (shown, holds.captcha) {
            (true, false) => {
                holds.captcha = true;
                HoldChange::Engaged
            }
            (false, true) => {
                holds.captcha = false;
                HoldChange::Released
            }
            _ => HoldChange::Unchanged,
        }
    }

    pub fn reset(&mut self) {
        self.challenge_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engage_and_release_are_idempotent() {
        let mut supervisor = InterruptionSupervisor::default();
        let mut holds = Holds::default();
        assert_eq!(supervisor.on_challenge(true, true, &mut holds), HoldChange::Engaged);
        assert_eq!(supervisor.on_challenge(true, true, &mut holds), HoldChange::Unchanged);
        assert!(holds.captcha);
        assert_eq!(supervisor.on_challenge(false, true, &mut holds), HoldChange::Released);
        assert_eq!(supervisor.on_challenge(false, true, &mut holds), HoldChange::Unchanged);
        assert!(!holds.captcha);
    }

    #[test]
    fn release_keeps_other_holds() {
        let mut supervisor = InterruptionSupervisor::default();
        let mut holds = Holds {
            depletion: true,
            ..Holds::default()
        };
        supervisor.on_challenge(true, true, &mut holds);
        supervisor.on_challenge(false, true, &mut holds);
        assert!(holds.depletion);
        assert!(holds.any());
    }

    #[test]
    fn idle_runs_are_not_held() {
        let mut supervisor = InterruptionSupervisor::default();
        let mut holds = Holds::default();
        assert_eq!(supervisor.on_challenge(true, false, &mut holds), HoldChange::Unchanged);
        assert!(!holds.captcha);
        assert!(supervisor.challenge_visible());
    }
}
