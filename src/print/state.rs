//! Print job state machine

/// Lifecycle of a print job
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobPhase {
    #[default]
    Idle,
    Selecting,
    Rendering,
    Done,
    Canceled,
    Failed,
}

impl JobPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Canceled | JobPhase::Failed)
    }
}

/// Progress bookkeeping of one print job
#[derive(Clone, Debug, Default)]
pub struct PrintJobState {
    phase: JobPhase,
    total: usize,
    completed: usize,
}

impl PrintJobState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// `(completed, total)` while pages are rendering
    #[must_use]
    pub fn progress(&self) -> Option<(usize, usize)> {
        (self.phase == JobPhase::Rendering).then_some((self.completed, self.total))
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::Select => match self.phase {
                JobPhase::Idle | JobPhase::Done | JobPhase::Canceled | JobPhase::Failed => {
                    self.phase = JobPhase::Selecting;
                    self.total = 0;
                    self.completed = 0;
                    vec![]
                }
                JobPhase::Selecting | JobPhase::Rendering => vec![],
            },

            Command::Start { total } => match self.phase {
                JobPhase::Idle | JobPhase::Selecting => {
                    self.phase = JobPhase::Rendering;
                    self.total = total;
                    self.completed = 0;
                    vec![
                        Effect::IssueRenders,
                        Effect::EmitProgress {
                            completed: 0,
                            total,
                        },
                    ]
                }
                _ => vec![],
            },

            Command::PageRendered => {
                if self.phase != JobPhase::Rendering {
                    return vec![];
                }

                self.completed = (self.completed + 1).min(self.total);
                let mut effects = vec![Effect::EmitProgress {
                    completed: self.completed,
                    total: self.total,
                }];
                if self.completed == self.total {
                    self.phase = JobPhase::Done;
                    effects.push(Effect::Deliver);
                }
                effects
            }

            Command::Cancel => match self.phase {
                JobPhase::Selecting | JobPhase::Rendering => {
                    self.phase = JobPhase::Canceled;
                    self.completed = 0;
                    vec![Effect::CancelInFlight, Effect::ReportCanceled]
                }
                _ => vec![],
            },

            Command::Fail => match self.phase {
                JobPhase::Selecting | JobPhase::Rendering => {
                    self.phase = JobPhase::Failed;
                    vec![Effect::CancelInFlight, Effect::ReportFailure]
                }
                _ => vec![],
            },
        }
    }
}

/// Commands that move a print job along
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Pages are being chosen
    Select,
    /// Rendering of `total` pages begins
    Start { total: usize },
    /// One page finished compositing
    PageRendered,
    Cancel,
    Fail,
}

/// Effects produced by state changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Request a canvas for every selected page
    IssueRenders,
    EmitProgress { completed: usize, total: usize },
    /// Cancel every tracked canvas load
    CancelInFlight,
    /// Hand the ordered artifacts over
    Deliver,
    ReportCanceled,
    ReportFailure,
}
