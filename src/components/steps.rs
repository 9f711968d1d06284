use serde::Serialize;

use crate::content::Step;
use crate::error::StepError;

/// What the media/text pane shows for the active step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub index: usize,
    pub id: u32,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub body: &'static str,
    pub media_ref: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepButton {
    pub index: usize,
    pub label: &'static str,
    pub active: bool,
}

/// Narrative switcher over a fixed, ordered list of steps.
///
/// Selection is synchronous and emits no telemetry; callers that want a click
/// event capture it themselves.
#[derive(Debug, Clone)]
pub struct StepNavigator {
    steps: &'static [Step],
    active_index: usize,
}

impl StepNavigator {
    pub fn new(steps: &'static [Step], default_index: usize) -> Result<Self, StepError> {
        if steps.is_empty() {
            return Err(StepError::Empty);
        }
        if default_index >= steps.len() {
            return Err(StepError::OutOfRange {
                index: default_index,
                len: steps.len(),
            });
        }
        Ok(Self {
            steps,
            active_index: default_index,
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_step(&self) -> &'static Step {
        &self.steps[self.active_index]
    }

    pub fn step(&self, index: usize) -> Option<&'static Step> {
        self.steps.get(index)
    }

    /// Activates step `index`. Out-of-range input is rejected and leaves the state untouched.
    pub fn select_step(&mut self, index: usize) -> Result<StepView, StepError> {
        if index >= self.steps.len() {
            let err = StepError::OutOfRange {
                index,
                len: self.steps.len(),
            };
            tracing::error!("select_step rejected: {}", err);
            return Err(err);
        }
        self.active_index = index;
        Ok(self.render())
    }

    pub fn render(&self) -> StepView {
        let step = self.active_step();
        StepView {
            index: self.active_index,
            id: step.id,
            title: step.title,
            subtitle: step.subtitle,
            body: step.body,
            media_ref: step.media_ref,
        }
    }

    pub fn buttons(&self) -> Vec<StepButton> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| StepButton {
                index,
                label: step.label,
                active: index == self.active_index,
            })
            .collect()
    }
}
