#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLifecycle {
    Idle,
    Running,
    Paused,
    CaptchaHeld,
    Finished,
    Stopped,
}

impl RunLifecycle {
    /// A run exists, whether or not it is currently dispatching.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused | Self::CaptchaHeld)
    }
}

pub fn can_transition(from: RunLifecycle, to: RunLifecycle) -> bool {
    use RunLifecycle::*;
    matches!(
        (from, to),
        (Idle | Finished | Stopped, Running)
            | (Running, Paused | CaptchaHeld | Finished)
            | (Paused, CaptchaHeld | Running)
            | (CaptchaHeld, Paused | Running)
            | (Running | Paused | CaptchaHeld, Stopped)
    ) || from == to
}

/// Independent reasons for holding a run. The runner only dispatches when
/// none is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Holds {
    /// User pause or a dispatch failure.
    pub paused: bool,
    pub captcha: bool,
    pub depletion: bool,
}

impl Holds {
    pub fn any(self) -> bool {
        self.paused || self.captcha || self.depletion
    }

    pub fn lifecycle(self) -> RunLifecycle {
        if self.captcha {
            RunLifecycle::CaptchaHeld
        } else if self.any() {
            RunLifecycle::Paused
        } else {
            RunLifecycle::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_and_stopped_can_restart() {
        assert!(can_transition(RunLifecycle::Finished, RunLifecycle::Running));
        assert!(can_transition(RunLifecycle::Stopped, RunLifecycle::Running));
        assert!(!can_transition(RunLifecycle::Idle, RunLifecycle::Paused));
        assert!(!can_transition(RunLifecycle::Finished, RunLifecycle::Stopped));
    }

    #[test]
    fn captcha_hold_wins_over_pause() {
        let holds = Holds {
            paused: true,
            captcha: true,
            depletion: false,
        };
        assert_eq!(holds.lifecycle(), RunLifecycle::CaptchaHeld);
        assert_eq!(
            Holds {
                depletion: true,
                ..Holds::default()
            }
            .lifecycle(),
            RunLifecycle::Paused
        );
        assert_eq!(Holds::default().lifecycle(), RunLifecycle::Running);
    }
}
