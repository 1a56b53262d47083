use color_eyre::Result;
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap},
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    event::{AppEvent, EventHandler},
    form::{display_value, fields_for, FieldKind, FormField, WizardForm},
};
use crate::application::{SubmissionGateway, SubmissionKind, SubmitReceipt};
use crate::domain::*;

const LABEL_WIDTH: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Editing,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Rates used by the previews on the payment and financing steps.
#[derive(Debug, Clone, Copy)]
pub struct PreviewSettings {
    pub project_tax_rate: TaxRate,
    pub financing_fee_percent: Decimal,
}

pub struct WizardApp {
    gateway: Arc<SubmissionGateway>,
    user_id: UserId,
    settings: PreviewSettings,
    session_id: Uuid,

    wizard: Wizard,
    form: WizardForm,
    focus: usize,

    mode: AppMode,
    status: Option<StatusMessage>,
    receipt: Option<SubmitReceipt>,
}

impl WizardApp {
    pub fn new(
        gateway: Arc<SubmissionGateway>,
        user_id: UserId,
        settings: PreviewSettings,
        draft: Option<ProjectDraft>,
    ) -> Self {
        let wizard = draft.map(Wizard::from_draft).unwrap_or_default();
        let form = WizardForm::from_draft(wizard.draft());
        let session_id = Uuid::new_v4();
        tracing::info!(session = %session_id, user = %user_id, "wizard started");

        Self {
            gateway,
            user_id,
            settings,
            session_id,
            wizard,
            form,
            focus: 0,
            mode: AppMode::Editing,
            status: None,
            receipt: None,
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn into_receipt(self) -> Option<SubmitReceipt> {
        self.receipt
    }

    fn fields(&self) -> Vec<FormField> {
        fields_for(self.wizard.step(), self.wizard.draft())
    }

    fn focused_field(&self) -> Option<FormField> {
        let fields = self.fields();
        fields.get(self.focus.min(fields.len().saturating_sub(1))).copied()
    }

    pub fn focused(&self) -> Option<FormField> {
        self.focused_field()
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    fn commit_focused(&mut self) {
        if let Some(field) = self.focused_field() {
            if field.kind() == FieldKind::Text {
                if let Err(message) = self.form.apply_text(field, &mut self.wizard) {
                    self.error(format!("{}: {message}", field.label()));
                }
            }
        }
    }

    /// Keeps the draft in step with a text buffer while typing. Parse
    /// errors stay next to the field until focus leaves it.
    fn sync_text(&mut self, field: FormField) {
        let _ = self.form.apply_text(field, &mut self.wizard);
    }

    fn move_focus(&mut self, forward: bool) {
        self.commit_focused();
        let count = self.fields().len();
        if count == 0 {
            return;
        }
        let current = self.focus.min(count - 1);
        self.focus = if forward {
            (current + 1) % count
        } else {
            (current + count - 1) % count
        };
    }

    /// Returns `Ok(true)` when the app should exit.
    pub async fn handle_event(&mut self, event: AppEvent) -> Result<bool> {
        if self.mode == AppMode::Help {
            self.mode = AppMode::Editing;
            return Ok(matches!(event, AppEvent::Quit));
        }

        match event {
            AppEvent::Quit => return Ok(true),
            AppEvent::ShowHelp => self.mode = AppMode::Help,
            AppEvent::CloseModal => self.status = None,
            AppEvent::NextStep => return Ok(self.next_step().await),
            AppEvent::PreviousStep => {
                self.commit_focused();
                let step = self.wizard.back();
                self.focus = 0;
                self.info(step.title());
            }
            AppEvent::SaveDraft => {
                self.commit_focused();
                return Ok(self.submit(SubmissionKind::Draft).await);
            }
            AppEvent::NextField => self.move_focus(true),
            AppEvent::PreviousField => self.move_focus(false),
            AppEvent::CycleForward | AppEvent::CycleBackward => {
                let forward = event == AppEvent::CycleForward;
                if let Some(field) = self.focused_field() {
                    match field.kind() {
                        FieldKind::Choice => self.form.cycle_choice(field, forward, &mut self.wizard),
                        FieldKind::Toggle => self.form.toggle(field, &mut self.wizard),
                        FieldKind::Text | FieldKind::Entry => {
                            let input = self.form.input_mut(field);
                            if forward {
                                input.move_right();
                            } else {
                                input.move_left();
                            }
                        }
                    }
                }
            }
            AppEvent::Character(c) => {
                if let Some(field) = self.focused_field() {
                    match field.kind() {
                        FieldKind::Text => {
                            self.form.input_mut(field).insert_char(c);
                            self.sync_text(field);
                        }
                        FieldKind::Entry => self.form.input_mut(field).insert_char(c),
                        FieldKind::Choice if c == ' ' => {
                            self.form.cycle_choice(field, true, &mut self.wizard)
                        }
                        FieldKind::Toggle if c == ' ' => self.form.toggle(field, &mut self.wizard),
                        FieldKind::Choice | FieldKind::Toggle => {}
                    }
                }
            }
            AppEvent::Backspace | AppEvent::Delete => {
                if let Some(field) = self.focused_field() {
                    match field.kind() {
                        FieldKind::Text => {
                            let input = self.form.input_mut(field);
                            if event == AppEvent::Backspace {
                                input.delete_char();
                            } else {
                                input.delete_forward();
                            }
                            self.sync_text(field);
                        }
                        FieldKind::Entry if self.form.input(field).map_or(true, |i| i.is_empty()) => {
                            if let Some(removed) = self.form.remove_last(field, &mut self.wizard) {
                                self.info(format!("Removed {removed}"));
                            }
                        }
                        FieldKind::Entry => {
                            let input = self.form.input_mut(field);
                            if event == AppEvent::Backspace {
                                input.delete_char();
                            } else {
                                input.delete_forward();
                            }
                        }
                        FieldKind::Choice | FieldKind::Toggle => {}
                    }
                }
            }
            AppEvent::Enter => match self.focused_field() {
                None => return Ok(self.next_step().await),
                Some(field) => match field.kind() {
                    FieldKind::Entry => match self.form.submit_entry(field, &mut self.wizard) {
                        Ok(message) => self.info(message),
                        Err(message) => self.error(message),
                    },
                    FieldKind::Toggle => self.form.toggle(field, &mut self.wizard),
                    FieldKind::Choice => self.form.cycle_choice(field, true, &mut self.wizard),
                    FieldKind::Text => self.move_focus(true),
                },
            },
        }

        Ok(false)
    }

    async fn next_step(&mut self) -> bool {
        self.commit_focused();
        match self.wizard.next() {
            StepOutcome::Advanced(step) => {
                self.focus = 0;
                self.info(step.title());
                false
            }
            StepOutcome::Rejected(errors) => {
                let fields = self.fields();
                if let Some(first) = fields.iter().position(|f| {
                    f.validation_field()
                        .is_some_and(|v| errors.contains(v))
                }) {
                    self.focus = first;
                }
                self.error(format!("Please fix {} field(s) before continuing", errors.len()));
                false
            }
            StepOutcome::ReadyToFinalize => self.submit(SubmissionKind::Final).await,
        }
    }

    async fn submit(&mut self, kind: SubmissionKind) -> bool {
        tracing::info!(session = %self.session_id, %kind, "submitting");
        let result = match kind {
            SubmissionKind::Draft => self.gateway.save_draft(self.wizard.draft(), &self.user_id).await,
            SubmissionKind::Final => self.gateway.finalize(self.wizard.draft(), &self.user_id).await,
        };

        match result {
            Ok(receipt) => {
                self.receipt = Some(receipt);
                true
            }
            Err(e) => {
                self.error(e.message);
                false
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Step tabs
                Constraint::Min(0),    // Form + preview
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

        self.render_steps(frame, main_chunks[0]);

        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[1]);

        if self.wizard.step() == WizardStep::Review {
            self.render_review(frame, main_chunks[1]);
        } else {
            self.render_form(frame, content_chunks[0]);
            self.render_preview(frame, content_chunks[1]);
        }

        self.render_status_bar(frame, main_chunks[2]);

        if self.mode == AppMode::Help {
            self.render_help(frame);
        }
    }

    fn render_steps(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<String> = WizardStep::ALL
            .iter()
            .map(|s| format!("{}. {}", s.index() + 1, s.title()))
            .collect();

        let tabs = Tabs::new(titles)
            .select(self.wizard.step().index())
            .block(
                Block::default()
                    .title("New Project")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            )
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            );

        frame.render_widget(tabs, area);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(self.wizard.step().title())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Green));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let draft = self.wizard.draft();
        let focused = self.focused_field();
        let mut lines: Vec<Line> = Vec::new();
        let mut cursor = None;

        if self.wizard.step() == WizardStep::PaymentStructure {
            for structure in PaymentStructure::ALL {
                let selected = draft.payment_structure() == Some(*structure);
                let marker = if selected { "(•) " } else { "( ) " };
                lines.push(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(structure.title(), Style::default().add_modifier(Modifier::BOLD)),
                ]));
                lines.push(Line::from(Span::styled(
                    format!("    {}", structure.description()),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.push(Line::default());
        }

        for field in self.fields() {
            let is_focused = focused == Some(field);
            let label_style = if is_focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let mut spans = vec![Span::styled(
                format!("{:<width$}", field.label(), width = LABEL_WIDTH),
                label_style,
            )];

            match field.kind() {
                FieldKind::Text => {
                    let input = self.form.input(field).cloned().unwrap_or_default();
                    if is_focused {
                        cursor = Some((lines.len(), LABEL_WIDTH + input.cursor()));
                    }
                    spans.push(input.span(is_focused, field.placeholder()));
                }
                FieldKind::Entry => {
                    let listed = display_value(field, draft);
                    if !listed.is_empty() {
                        spans.push(Span::styled(listed, Style::default().fg(Color::Cyan)));
                        lines.push(Line::from(spans));
                        spans = vec![Span::raw(" ".repeat(LABEL_WIDTH))];
                    }
                    let input = self.form.input(field).cloned().unwrap_or_default();
                    if is_focused {
                        cursor = Some((lines.len(), LABEL_WIDTH + input.cursor()));
                    }
                    spans.push(input.span(is_focused, field.placeholder()));
                }
                FieldKind::Choice => {
                    let arrows = if is_focused { "◀ " } else { "  " };
                    spans.push(Span::raw(arrows));
                    spans.push(Span::raw(display_value(field, draft)));
                    if is_focused {
                        spans.push(Span::raw(" ▶"));
                    }
                }
                FieldKind::Toggle => spans.push(Span::raw(display_value(field, draft))),
            }
            lines.push(Line::from(spans));

            let message = field
                .validation_field()
                .and_then(|v| self.wizard.errors().get(v))
                .or_else(|| self.form.input_error(field));
            if let Some(message) = message {
                lines.push(Line::from(Span::styled(
                    format!("{:width$}{message}", "", width = LABEL_WIDTH),
                    Style::default().fg(Color::Red),
                )));
            }
        }

        // Errors for fields that are not on screen (e.g. missing payment type)
        for (field, message) in self.wizard.errors().iter() {
            let shown = self
                .fields()
                .iter()
                .any(|f| f.validation_field() == Some(field));
            if !shown {
                lines.push(Line::from(Span::styled(
                    message.to_string(),
                    Style::default().fg(Color::Red),
                )));
            }
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        if let Some((row, column)) = cursor {
            let x = inner.x + column as u16;
            let y = inner.y + row as u16;
            if x < inner.x + inner.width && y < inner.y + inner.height {
                frame.set_cursor_position((x, y));
            }
        }
    }

    pub fn preview_lines(&self) -> Vec<String> {
        let draft = self.wizard.draft();
        let mut lines = Vec::new();
        let currency = draft.currency.map(|c| c.to_string()).unwrap_or_default();

        if let Some(structure) = draft.payment_structure() {
            lines.push(format!("{}: {}", structure.title(), structure.description()));
        }

        let Some(amount) = draft.project_amount else {
            if self.wizard.step() >= WizardStep::PaymentDetails {
                lines.push("Enter a project amount to see the breakdown".to_string());
            }
            return lines;
        };

        if let Some(handling) = draft.tax_handling {
            let tax = TaxBreakdown::compute(amount, handling, self.settings.project_tax_rate);
            lines.push(String::new());
            lines.push(format!("Subtotal: {} {}", format_money(tax.subtotal), currency));
            lines.push(format!(
                "GST ({}): {} {}",
                self.settings.project_tax_rate,
                format_money(tax.tax),
                currency
            ));
            lines.push(format!("Total: {} {}", format_money(tax.total), currency));
        }

        match &draft.plan {
            Some(PaymentPlan::Milestones(milestones)) => {
                lines.push(String::new());
                for milestone in milestones {
                    lines.push(format!(
                        "{} ({}%): {} {}",
                        milestone.name,
                        milestone.percent.normalize(),
                        format_money(milestone_amount(amount, milestone)),
                        currency
                    ));
                }
                lines.push(format!("Allocated: {}%", draft.milestone_allocation().normalize()));
            }
            Some(PaymentPlan::Recurring(schedule)) => {
                if let Some(duration) = schedule.contract_duration.filter(|d| *d > 0) {
                    lines.push(String::new());
                    lines.push(format!(
                        "{} installments of {} {}",
                        duration,
                        format_money(installment_amount(amount, Some(duration))),
                        currency
                    ));
                    if let Some(last) = self.wizard.recurring_options().last() {
                        lines.push(format!("Billable periods: Month 1 to {}", last.name));
                    }
                }
            }
            Some(PaymentPlan::Single) | None => {}
        }

        if self.wizard.step() >= WizardStep::Financing && draft.financing == Some(Financing::Yes) {
            let financing = FinancingBreakdown::compute(amount, self.settings.financing_fee_percent);
            lines.push(String::new());
            lines.push(format!("Project total: {} {}", format_money(financing.total), currency));
            lines.push(format!(
                "Service fee ({}%): {} {}",
                self.settings.financing_fee_percent.normalize(),
                format_money(financing.service_fee),
                currency
            ));
            lines.push(format!("You receive: {} {}", format_money(financing.receive), currency));
        }

        lines
    }

    fn render_preview(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self.preview_lines().into_iter().map(Line::from).collect();
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title("Preview")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Gray)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_review(&self, frame: &mut Frame, area: Rect) {
        let draft = self.wizard.draft();
        let value = |v: String| if v.is_empty() { "-".to_string() } else { v };
        let mut lines: Vec<Line> = Vec::new();

        let rows = [
            ("Project Name", draft.project_name.clone()),
            ("Project Type", display_value(FormField::ProjectType, draft)),
            ("Client", display_value(FormField::Client, draft)),
            ("Status", display_value(FormField::ProjectStatus, draft)),
            (
                "Schedule",
                format!(
                    "{} to {}",
                    draft.start_date.map(|d| d.to_string()).unwrap_or_default(),
                    draft.end_date.map(|d| d.to_string()).unwrap_or_default()
                ),
            ),
            ("Description", draft.description.clone()),
            ("Tags", draft.tags.join(", ")),
            ("Media", display_value(FormField::Media, draft)),
            ("Contact", {
                let parts: Vec<&str> = [
                    draft.contact_name.as_str(),
                    draft.contact_role.as_str(),
                    draft.contact_brand.as_str(),
                    draft.contact_email.as_str(),
                    draft.contact_number.as_str(),
                ]
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .collect();
                parts.join(" · ")
            }),
            ("Financing", display_value(FormField::Financing, draft)),
        ];
        for (label, text) in rows {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{label:<width$}", width = LABEL_WIDTH),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(value(text)),
            ]));
        }

        lines.push(Line::default());
        lines.extend(self.preview_lines().into_iter().map(Line::from));

        let warnings = self.wizard.review_warnings();
        if !warnings.is_empty() {
            lines.push(Line::default());
            for warning in warnings {
                lines.push(Line::from(Span::styled(
                    format!("⚠ {warning}"),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Press Enter to create the project, Ctrl+S to save it as a draft",
            Style::default().fg(Color::Green),
        )));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title("Review")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Green)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let paragraph = match &self.status {
            Some(status) => {
                let color = if status.is_error { Color::Red } else { Color::Green };
                Paragraph::new(status.text.as_str()).style(Style::default().fg(color))
            }
            None => {
                let help_text = match self.focused_field().map(|f| f.kind()) {
                    Some(FieldKind::Choice) => "←/→: change | Tab: next field | Ctrl+N: next step | Ctrl+B: back | Ctrl+S: save draft | F1: help",
                    Some(FieldKind::Entry) => "Enter: add | Backspace on empty: remove last | Tab: next field | Ctrl+N: next step | F1: help",
                    Some(FieldKind::Toggle) => "Space: toggle | Tab: next field | Ctrl+N: next step | Ctrl+S: save draft | F1: help",
                    Some(FieldKind::Text) => "Type to edit | Tab: next field | Ctrl+N: next step | Ctrl+B: back | Ctrl+S: save draft | F1: help",
                    None => "Enter: create project | Ctrl+B: back | Ctrl+S: save draft | Ctrl+C: quit",
                };
                Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray))
            }
        };
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let popup_area = Self::centered_rect(60, 70, frame.area());

        frame.render_widget(Clear, popup_area);

        let help_text = [
            "Creator Desk Help",
            "",
            "Fields:",
            "  Tab / ↓        - Next field",
            "  Shift+Tab / ↑  - Previous field",
            "  ← / →          - Change a choice, move the cursor in text",
            "  Space          - Toggle a checkbox or change a choice",
            "  Enter          - Add a tag, media file or milestone",
            "  Backspace      - On an empty list entry, remove the last item",
            "",
            "Steps:",
            "  Ctrl+N / PgDn  - Next step (checks required fields)",
            "  Ctrl+B / PgUp  - Previous step",
            "  Ctrl+S         - Save as draft",
            "  Enter          - On the review step, create the project",
            "",
            "General:",
            "  F1             - Show this help",
            "  Esc            - Dismiss the status message",
            "  Ctrl+C         - Quit without saving",
            "",
            "Press any key to close this help",
        ]
        .join("\n");

        let paragraph = Paragraph::new(help_text)
            .block(Block::default().title("Help").borders(Borders::ALL))
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, popup_area);
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

/// Runs the wizard until it is submitted or abandoned.
pub async fn run_tui(mut app: WizardApp) -> Result<Option<SubmitReceipt>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_handler = EventHandler::new();
    let outcome = async {
        loop {
            terminal.draw(|frame| app.render(frame))?;

            if let Some(event) = event_handler.next_event().await? {
                if app.handle_event(event).await? {
                    break;
                }
            }

            if event_handler.should_quit() {
                break;
            }
        }
        Ok::<(), color_eyre::Report>(())
    }
    .await;

    // Restore the terminal even when the loop failed
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    outcome?;
    Ok(app.into_receipt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockProjectRepository, RepositoryError};
    use ratatui::backend::TestBackend;

    fn settings() -> PreviewSettings {
        PreviewSettings {
            project_tax_rate: TaxRate::project_gst(),
            financing_fee_percent: Decimal::from(20),
        }
    }

    fn app_with(repo: MockProjectRepository, draft: Option<ProjectDraft>) -> WizardApp {
        WizardApp::new(
            Arc::new(SubmissionGateway::new(Arc::new(repo))),
            UserId::from("u-1"),
            settings(),
            draft,
        )
    }

    async fn type_text(app: &mut WizardApp, text: &str) {
        for c in text.chars() {
            app.handle_event(AppEvent::Character(c)).await.unwrap();
        }
    }

    fn screen(app: &mut WizardApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_typing_updates_draft() {
        let mut app = app_with(MockProjectRepository::new(), None);
        assert_eq!(app.focused(), Some(FormField::ProjectName));

        type_text(&mut app, "Spring lookbook").await;
        assert_eq!(app.wizard().draft().project_name, "Spring lookbook");

        app.handle_event(AppEvent::NextField).await.unwrap();
        app.handle_event(AppEvent::CycleForward).await.unwrap();
        assert_eq!(
            app.wizard().draft().project_type,
            Some(ProjectType::ProductPhotography)
        );
    }

    #[tokio::test]
    async fn test_next_step_rejected_focuses_first_error() {
        let mut app = app_with(MockProjectRepository::new(), None);
        type_text(&mut app, "Name only").await;

        let quit = app.handle_event(AppEvent::NextStep).await.unwrap();
        assert!(!quit);
        assert_eq!(app.wizard().step(), WizardStep::Details);
        assert_eq!(app.focused(), Some(FormField::ProjectType));
        assert!(app.status().is_some_and(|s| s.is_error));

        let text = screen(&mut app);
        assert!(text.contains("Project Type is required"));
    }

    #[tokio::test]
    async fn test_save_draft_returns_receipt() {
        let mut repo = MockProjectRepository::new();
        repo.expect_save_draft()
            .withf(|draft, user| draft.project_name == "Teaser" && user.0 == "u-1")
            .times(1)
            .returning(|draft, _| {
                Ok(ProjectRecord {
                    id: ProjectId::from("dp-1"),
                    draft: draft.clone(),
                    is_draft: true,
                    created_at: None,
                    updated_at: None,
                })
            });

        let mut app = app_with(repo, None);
        type_text(&mut app, "Teaser").await;
        assert!(app.handle_event(AppEvent::SaveDraft).await.unwrap());

        let receipt = app.into_receipt().unwrap();
        assert_eq!(receipt.kind, SubmissionKind::Draft);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_wizard_open() {
        let mut repo = MockProjectRepository::new();
        repo.expect_save_draft()
            .returning(|_, _| Err(RepositoryError::Network("offline".to_string())));

        let mut app = app_with(repo, None);
        assert!(!app.handle_event(AppEvent::SaveDraft).await.unwrap());
        assert_eq!(
            app.status().map(|s| s.text.as_str()),
            Some(crate::ports::NETWORK_ERROR_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_preview_shows_tax_and_milestones() {
        let mut draft = ProjectDraft {
            project_amount: Some(Decimal::from(118)),
            currency: Some(Currency::Pkr),
            tax_handling: Some(TaxHandling::Inclusive),
            ..Default::default()
        };
        draft.select_structure(PaymentStructure::Multiple);
        draft
            .add_milestone(Milestone::new("Shoot", Decimal::from(50), ""))
            .unwrap();

        let app = app_with(MockProjectRepository::new(), Some(draft));
        let preview = app.preview_lines();
        assert!(preview.contains(&"Subtotal: 100.00 PKR".to_string()));
        assert!(preview.contains(&"GST (18%): 18.00 PKR".to_string()));
        assert!(preview.contains(&"Shoot (50%): 59.00 PKR".to_string()));
        assert!(preview.contains(&"Allocated: 50%".to_string()));
    }

    #[tokio::test]
    async fn test_help_closes_on_any_key() {
        let mut app = app_with(MockProjectRepository::new(), None);
        app.handle_event(AppEvent::ShowHelp).await.unwrap();
        assert!(screen(&mut app).contains("Creator Desk Help"));

        app.handle_event(AppEvent::Character('x')).await.unwrap();
        assert_eq!(app.wizard().draft().project_name, "");
        assert!(!screen(&mut app).contains("Creator Desk Help"));
    }
}
