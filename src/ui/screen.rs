use ratatui::Frame;

use crate::{
    ui::{render_prompt, render_session_chart},
    App, AppState, Prompt,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Timer screen - solve list, scramble, timer and statistics
pub struct TimerScreen;

impl Screen for TimerScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Chart screen - progression of singles and averages
pub struct ChartScreen;

impl Screen for ChartScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        render_session_chart(app, area, f.buffer_mut());
    }
}

/// Prompt screen - the timer screen with an input box on top
pub struct PromptScreen(pub Prompt);

impl Screen for PromptScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        f.render_widget(app, area);
        render_prompt(app, &self.0, area, f.buffer_mut());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Timer => Box::new(TimerScreen),
        AppState::Chart => Box::new(ChartScreen),
        AppState::Prompt(prompt) => Box::new(PromptScreen(prompt.clone())),
    }
}
