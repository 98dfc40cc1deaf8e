use std::path::Path;
use std::time::{Duration, Instant};

use chatpane_core::{
    Attachment, ChatState, Composer, Dispatcher, Message, Reply, ScrollRequest,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::wrap;

/// Delay before a reply scrolls the transcript into view
pub const SMOOTH_SCROLL_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    History,
    Transcript,
    Composer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    Login,
    FilePicker,
    Port,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub field: LoginField,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn active_input(&mut self) -> &mut String {
        match self.field {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub popup: Option<Popup>,

    // Pipeline
    pub chat: ChatState,
    pub composer: Composer,
    pub dispatcher: Dispatcher,
    reply_tx: mpsc::UnboundedSender<Reply>,
    pub in_flight: usize,

    // History panel
    pub history_state: ListState,
    /// Query picked in the history panel, waiting for the composer
    pub selected_query: Option<String>,

    // Transcript view
    pub transcript_scroll: u16,
    pub transcript_height: u16,
    pub transcript_width: u16,
    pub smooth_scroll_due: Option<Instant>,

    // Popups
    pub login: LoginForm,
    pub picker_error: Option<String>,

    // Animation state
    pub animation_frame: u8,

    // Panel areas for mouse hit-testing (updated during render)
    pub history_area: Option<Rect>,
    pub transcript_area: Option<Rect>,
}

impl App {
    pub fn new(chat: ChatState, dispatcher: Dispatcher, reply_tx: mpsc::UnboundedSender<Reply>) -> Self {
        let mut history_state = ListState::default();
        if !chat.history.is_empty() {
            history_state.select(Some(0));
        }

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Composer,
            popup: None,

            chat,
            composer: Composer::new(),
            dispatcher,
            reply_tx,
            in_flight: 0,

            history_state,
            selected_query: None,

            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,
            smooth_scroll_due: None,

            login: LoginForm::default(),
            picker_error: None,

            animation_frame: 0,

            history_area: None,
            transcript_area: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.chat.session.is_admin
    }

    // Sending

    /// Hand the composer's content to the dispatcher; the network half runs
    /// on its own task and comes back through the reply channel.
    pub fn submit(&mut self) {
        let Some(submission) = self.composer.submit(self.is_admin()) else {
            return;
        };

        if let Some(pending) = self.dispatcher.prepare(&mut self.chat, submission) {
            self.in_flight += 1;
            let tx = self.reply_tx.clone();
            tokio::spawn(async move {
                let reply = pending.resolve().await;
                // Receiver gone means the app is shutting down
                let _ = tx.send(reply);
            });
        }

        self.sync_history_selection();
        self.apply_scroll_request();
    }

    pub fn receive_reply(&mut self, reply: Reply) {
        self.in_flight = self.in_flight.saturating_sub(1);
        debug!(request_id = %reply.request_id, failed = reply.failed, "delivering reply");
        Dispatcher::deliver(&mut self.chat, reply);
        self.apply_scroll_request();
    }

    fn apply_scroll_request(&mut self) {
        match self.chat.transcript.take_scroll_request() {
            Some(ScrollRequest::Instant) => {
                self.smooth_scroll_due = None;
                self.scroll_transcript_to_bottom();
            }
            Some(ScrollRequest::Smooth) => {
                // Restart the debounce window
                self.smooth_scroll_due = Some(Instant::now() + SMOOTH_SCROLL_DELAY);
            }
            None => {}
        }
    }

    /// Tick: advance the waiting animation and any due smooth scroll
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        if self.in_flight > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }

        if let Some(due) = self.smooth_scroll_due {
            if now >= due {
                let target = self.max_transcript_scroll();
                if self.transcript_scroll < target {
                    let step = ((target - self.transcript_scroll) / 2).max(1);
                    self.transcript_scroll += step;
                }
                if self.transcript_scroll >= target {
                    self.smooth_scroll_due = None;
                }
            }
        }
    }

    // Transcript scrolling

    fn wrap_width(&self) -> usize {
        if self.transcript_width > 0 {
            self.transcript_width as usize
        } else {
            50
        }
    }

    /// Rows a message occupies when rendered at `wrap_width`
    pub fn message_rows(message: &Message, wrap_width: usize) -> usize {
        let mut rows: usize = 0;

        if message.attachment.is_some() {
            rows += 2; // preview block + caption
        }
        for line in message.shown_text().split('\n') {
            rows = rows.saturating_add(wrap::line_rows(line, wrap_width));
        }
        rows.saturating_add(2) // timestamp + blank line after message
    }

    pub fn transcript_rows(&self) -> usize {
        let width = self.wrap_width();
        let total = self
            .chat
            .transcript
            .messages()
            .iter()
            .fold(0usize, |acc, m| acc.saturating_add(Self::message_rows(m, width)));
        if self.in_flight > 0 {
            total.saturating_add(1) // waiting indicator
        } else {
            total
        }
    }

    /// Furthest scroll offset, capped at what `Paragraph::scroll` can take
    pub fn max_transcript_scroll(&self) -> u16 {
        let visible = if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        };
        let max = self.transcript_rows().saturating_sub(visible as usize);
        u16::try_from(max).unwrap_or(u16::MAX)
    }

    pub fn scroll_transcript_to_bottom(&mut self) {
        self.transcript_scroll = self.max_transcript_scroll();
    }

    pub fn scroll_transcript_down(&mut self, rows: u16) {
        self.transcript_scroll = self
            .transcript_scroll
            .saturating_add(rows)
            .min(self.max_transcript_scroll());
    }

    pub fn scroll_transcript_up(&mut self, rows: u16) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(rows);
    }

    // History panel

    fn sync_history_selection(&mut self) {
        if self.chat.history.is_empty() {
            self.history_state.select(None);
        } else {
            // Newest entry is always at the top
            self.history_state.select(Some(0));
        }
    }

    pub fn history_nav_down(&mut self) {
        let len = self.chat.history.len();
        if len > 0 {
            let i = self.history_state.selected().unwrap_or(0);
            self.history_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn history_nav_up(&mut self) {
        let i = self.history_state.selected().unwrap_or(0);
        self.history_state.select(Some(i.saturating_sub(1)));
    }

    /// Pick the highlighted history entry and hand it to the composer
    pub fn select_history_entry(&mut self) {
        let Some(query) = self
            .history_state
            .selected()
            .and_then(|i| self.chat.history.get(i))
        else {
            return;
        };
        self.selected_query = Some(query.to_string());
        self.apply_selected_query();
    }

    fn apply_selected_query(&mut self) {
        if self.composer.apply_selected_query(&mut self.selected_query) {
            self.composer.scroll_to_cursor();
            self.focus = FocusPane::Composer;
            self.input_mode = InputMode::Editing;
        }
    }

    // Session settings

    pub fn cycle_model(&mut self) {
        let next = self.chat.session.selected_model.next();
        self.chat.session.set_model(self.chat.prefs.as_mut(), next);
        info!(model = next.as_str(), "model changed");
    }

    pub fn cycle_api_version(&mut self) {
        if !self.is_admin() {
            return;
        }
        let next = self.chat.session.api_version.next();
        self.chat.session.set_api_version(self.chat.prefs.as_mut(), next);
        info!(version = next.as_str(), "api version changed");
    }

    /// Port edits are stored on every keystroke
    pub fn edit_port(&mut self, raw: &str) {
        self.chat.session.set_port(self.chat.prefs.as_mut(), raw);
    }

    pub fn port_push(&mut self, c: char) {
        let raw = format!("{}{}", self.chat.session.port, c);
        self.edit_port(&raw);
    }

    pub fn port_pop(&mut self) {
        let mut raw = self.chat.session.port.clone();
        raw.pop();
        self.edit_port(&raw);
    }

    // Popups

    pub fn open_popup(&mut self, popup: Popup) {
        if popup == Popup::Port && !self.is_admin() {
            return;
        }
        self.popup = Some(popup);
        self.picker_error = None;
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
        self.login = LoginForm::default();
        self.picker_error = None;
    }

    /// Login when logged out, logout when logged in
    pub fn toggle_admin(&mut self) {
        if self.is_admin() {
            self.chat.session.logout(self.chat.prefs.as_mut());
        } else {
            self.open_popup(Popup::Login);
        }
    }

    pub fn submit_login(&mut self) {
        let ok = self.chat.session.login(
            self.chat.prefs.as_mut(),
            &self.login.username,
            &self.login.password,
        );
        if ok {
            self.close_popup();
        } else {
            self.login.password.clear();
            self.login.error = Some("Invalid username or password".to_string());
        }
    }

    pub fn confirm_file_picker(&mut self) {
        let raw = self.composer.picker_input.trim().to_string();
        let path = expand_home(&raw);

        if path.is_file() {
            info!(path = %path.display(), "file attached");
            self.composer.attach(Attachment::from_path(path));
            self.popup = None;
            self.picker_error = None;
        } else {
            self.picker_error = Some(format!("Not a file: {}", raw));
        }
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(raw: &str) -> std::path::PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(raw).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatpane_core::{
        ChatClient, MemoryPreferenceStore, Mode, PreferenceStore, Sender, StaticHost,
    };
    use std::sync::Arc;

    fn test_app(prefs: MemoryPreferenceStore) -> (App, mpsc::UnboundedReceiver<Reply>) {
        // Port 1 refuses connections, so every send fails fast
        let host = StaticHost::parse("http://127.0.0.1:1").unwrap();
        let dispatcher = Dispatcher::new(ChatClient::new(), Arc::new(host));
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(ChatState::load(Box::new(prefs)), dispatcher, tx);
        (app, rx)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.composer.insert_char(c);
        }
    }

    #[tokio::test]
    async fn test_submit_then_failed_reply() {
        let (mut app, mut rx) = test_app(MemoryPreferenceStore::new());
        type_text(&mut app, "hello");
        app.submit();

        assert_eq!(app.chat.transcript.len(), 1);
        assert_eq!(app.in_flight, 1);
        assert!(app.composer.text.is_empty());
        assert_eq!(app.chat.history.get(0), Some("hello"));

        let reply = rx.recv().await.unwrap();
        assert!(reply.failed);
        app.receive_reply(reply);

        assert_eq!(app.in_flight, 0);
        let last = app.chat.transcript.last().unwrap();
        assert_eq!(last.sender, Sender::Assistant);
        assert!(app.smooth_scroll_due.is_some());
    }

    #[test]
    fn test_blank_submit_does_nothing() {
        let (mut app, _rx) = test_app(MemoryPreferenceStore::new());
        type_text(&mut app, "   ");
        app.submit();
        assert!(app.chat.transcript.is_empty());
        assert_eq!(app.in_flight, 0);
    }

    #[test]
    fn test_history_selection_fills_composer() {
        let prefs = MemoryPreferenceStore::with_entries([("queryHistory", r#"["newest","older"]"#)]);
        let (mut app, _rx) = test_app(prefs);
        app.chat.session.is_admin = true;
        app.composer.select_mode(Mode::Data);
        app.focus = FocusPane::History;
        app.input_mode = InputMode::Normal;

        app.history_nav_down();
        app.select_history_entry();

        assert_eq!(app.composer.text, "older");
        assert_eq!(app.composer.mode, Mode::Query);
        assert_eq!(app.focus, FocusPane::Composer);
        assert_eq!(app.input_mode, InputMode::Editing);
        assert!(app.selected_query.is_none());
        assert_eq!(app.chat.history.entries(), ["newest", "older"]);
    }

    #[test]
    fn test_port_keystrokes_are_sanitized_and_stored() {
        let (mut app, _rx) = test_app(MemoryPreferenceStore::new());
        app.chat.session.is_admin = true;
        for c in "12a3456xyz".chars() {
            app.port_push(c);
        }
        assert_eq!(app.chat.session.port, "12345");
        assert_eq!(app.chat.prefs.read("apiPort").as_deref(), Some("12345"));

        app.port_pop();
        assert_eq!(app.chat.session.port, "1234");
    }

    #[test]
    fn test_port_editor_requires_admin() {
        let (mut app, _rx) = test_app(MemoryPreferenceStore::new());
        app.open_popup(Popup::Port);
        assert_eq!(app.popup, None);
    }

    #[test]
    fn test_login_flow() {
        let (mut app, _rx) = test_app(MemoryPreferenceStore::new());
        app.toggle_admin();
        assert_eq!(app.popup, Some(Popup::Login));

        app.login.username = "admin".to_string();
        app.login.password = "nope".to_string();
        app.submit_login();
        assert!(!app.is_admin());
        assert!(app.login.error.is_some());
        assert!(app.login.password.is_empty());

        app.login.password = "admin".to_string();
        app.submit_login();
        assert!(app.is_admin());
        assert_eq!(app.popup, None);

        app.toggle_admin();
        assert!(!app.is_admin());
        assert_eq!(app.chat.prefs.read("isAdmin"), None);
    }

    #[test]
    fn test_file_picker_rejects_missing_path() {
        let (mut app, _rx) = test_app(MemoryPreferenceStore::new());
        app.open_popup(Popup::FilePicker);
        app.composer.picker_input = "/no/such/file".to_string();
        app.confirm_file_picker();
        assert!(app.composer.attachment.is_none());
        assert_eq!(app.popup, Some(Popup::FilePicker));
        assert!(app.picker_error.is_some());
    }

    #[test]
    fn test_file_picker_attaches_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"png").unwrap();

        let (mut app, _rx) = test_app(MemoryPreferenceStore::new());
        app.open_popup(Popup::FilePicker);
        app.composer.picker_input = path.display().to_string();
        app.confirm_file_picker();

        assert_eq!(app.composer.attachment.as_ref().unwrap().name, "photo.png");
        assert_eq!(app.popup, None);
    }

    #[test]
    fn test_smooth_scroll_waits_for_debounce() {
        let (mut app, _rx) = test_app(MemoryPreferenceStore::new());
        app.transcript_height = 2;
        app.transcript_width = 40;
        for i in 0..5 {
            app.chat.transcript.append(
                Message::assistant(&format!("reply {}", i)),
                ScrollRequest::Smooth,
            );
        }
        app.apply_scroll_request();
        let due = app.smooth_scroll_due.unwrap();
        let target = app.max_transcript_scroll();
        assert!(target > 0);

        app.tick_at(due - Duration::from_millis(50));
        assert_eq!(app.transcript_scroll, 0);

        for _ in 0..16 {
            app.tick_at(due);
        }
        assert_eq!(app.transcript_scroll, target);
        assert!(app.smooth_scroll_due.is_none());
    }

    #[test]
    fn test_message_rows_counts_wrapping() {
        let msg = Message::assistant("abcdefghij\n\nxyz");
        // 2 rows for the first line at width 5, 1 blank, 1 for xyz, timestamp, spacer
        assert_eq!(App::message_rows(&msg, 5), 6);

        // Wide characters take two cells each
        let msg = Message::assistant("漢字漢字漢");
        assert_eq!(App::message_rows(&msg, 4), 5);
    }

    #[test]
    fn test_huge_reply_does_not_overflow_rows() {
        let msg = Message::assistant(&"x\n".repeat(70_000));
        assert_eq!(App::message_rows(&msg, 80), 70_003);

        let (mut app, _rx) = test_app(MemoryPreferenceStore::new());
        app.transcript_height = 20;
        app.transcript_width = 80;
        app.chat.transcript.append(msg, ScrollRequest::Instant);
        app.chat.transcript.append(Message::assistant(&"y\n".repeat(70_000)), ScrollRequest::Instant);

        assert_eq!(app.transcript_rows(), 140_006);
        assert_eq!(app.max_transcript_scroll(), u16::MAX);
        app.scroll_transcript_to_bottom();
        app.scroll_transcript_down(10);
        assert_eq!(app.transcript_scroll, u16::MAX);
    }
}
