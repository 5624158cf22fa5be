//! Application controller: owns the view state machine, the header/footer
//! chrome and the link to the background refresher.

use std::io;

use tokio::sync::mpsc;

use apo_core::state::SharedSnapshot;

use crate::query::QueryService;
use crate::refresh::{RefreshOutcome, Refresher};
use crate::terminal::{CursorControl, Key, Terminal};
use crate::ui::frame::Frame;
use crate::ui::style::{Attr, center_offset, display_width, style};
use crate::ui::views::{DetailContext, ViewId, Views};
use crate::ui::widgets::{StatusBar, TabBar};

const TITLE: &str = "╔═══ Azure Prod Ops ═══╗";
const TAB_ROW: u16 = 3;
const CONTENT_ROW: u16 = 5;
/// Header, tab strip and footer rows around the content region.
const CHROME_ROWS: u16 = 7;

const HELP_COPILOT: &str = " [Enter] Send │ [Esc] Back │ [Ctrl+C] Quit ";
const HELP_DETAIL: &str = " [Esc/b] Back │ [q] Quit ";
const HELP_FILTER: &str = " [Enter] Apply │ [Esc] Cancel │ Type to filter... ";
const HELP_DEFAULT: &str = " [1-5] Tab │ [/] Copilot │ [↑↓/jk] Navigate │ [Enter] Details │ [f] Filter │ [r] Refresh │ [q] Quit ";

pub struct App {
    views: Views,
    tab_bar: TabBar,
    status_bar: StatusBar,
    current: ViewId,
    previous: ViewId,
    snapshot: SharedSnapshot,
    refresher: Refresher,
    refresh_done: mpsc::UnboundedReceiver<RefreshOutcome>,
    location: String,
    running: bool,
}

impl App {
    pub fn new(
        context: DetailContext,
        query: Box<dyn QueryService>,
        snapshot: SharedSnapshot,
        refresher: Refresher,
        refresh_done: mpsc::UnboundedReceiver<RefreshOutcome>,
    ) -> Self {
        let location = format!("  {}/{}", context.organization, context.project);
        Self {
            views: Views::new(context, query),
            tab_bar: TabBar::standard(),
            status_bar: StatusBar::new(),
            current: ViewId::Dashboard,
            previous: ViewId::Dashboard,
            snapshot,
            refresher,
            refresh_done,
            location,
            running: true,
        }
    }

    #[cfg(test)]
    pub fn current(&self) -> ViewId {
        self.current
    }

    #[cfg(test)]
    pub fn previous(&self) -> ViewId {
        self.previous
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[cfg(test)]
    pub fn status_bar(&self) -> &StatusBar {
        &self.status_bar
    }

    /// Main loop: render, block on one key, dispatch. Runs on a blocking
    /// thread until the user quits or input closes.
    pub fn run(&mut self, term: &mut Terminal) -> io::Result<()> {
        term.clear_screen()?;
        self.start(term);

        while self.running {
            self.drain_refresh();

            let (rows, cols) = term.query_size();
            let mut frame = Frame::new(rows, cols);
            self.render(&mut frame);
            if let Err(e) = term.present(&frame) {
                tracing::warn!(error = %e, "failed to draw frame");
            }

            match term.read_key() {
                Ok(key) => self.handle_key(key, term),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    tracing::info!("input closed, leaving");
                    self.running = false;
                }
                Err(e) => tracing::warn!(error = %e, "failed to read key"),
            }
        }

        term.clear_screen()
    }

    /// Enter the initial view and kick off the first refresh.
    pub fn start(&mut self, cursor: &mut dyn CursorControl) {
        self.views.get_mut(self.current).on_enter(cursor);
        self.request_refresh("Loading...");
    }

    fn request_refresh(&mut self, message: &str) {
        if self.refresher.request() {
            self.status_bar.set_message(message);
        } else {
            self.status_bar.set_message("Refresh already in progress");
        }
    }

    /// Pick up finished refresh cycles; called before each frame.
    pub fn drain_refresh(&mut self) {
        while let Ok(outcome) = self.refresh_done.try_recv() {
            if outcome.aborted {
                self.status_bar.set_message("Refresh failed");
                continue;
            }
            if !outcome.failed.is_empty() {
                tracing::debug!(failed = ?outcome.failed, "refresh completed with failures");
            }
            self.status_bar.set_last_refresh(outcome.at);
            self.status_bar.set_message("Data refreshed");
        }
    }

    pub fn handle_key(&mut self, key: Key, cursor: &mut dyn CursorControl) {
        let filtering = self.views.get(self.current).is_filter_mode();
        match key {
            Key::Interrupt => {
                self.running = false;
                return;
            }
            // Filter mode gets Escape first to cancel the filter.
            Key::Escape if !filtering => {
                if self.current.is_detail() {
                    self.go_back(cursor);
                } else if self.current == ViewId::Copilot {
                    self.switch_to(ViewId::Dashboard, cursor);
                }
                return;
            }
            _ => {}
        }

        if self.views.get_mut(self.current).handle_key(key) {
            return;
        }

        let detail = self.current.is_detail();
        match key {
            Key::Char('q') | Key::Char('Q') => self.running = false,
            Key::Char('r') | Key::Char('R') => self.request_refresh("Refreshing..."),
            Key::Char('b') if detail => self.go_back(cursor),
            Key::Char(c) if !detail => {
                if let Some(id) = ViewId::from_shortcut(c) {
                    self.switch_to(id, cursor);
                }
            }
            Key::Tab if !detail => {
                self.tab_bar.next();
                if let Some(view) = self.tab_bar.active_tab().map(|tab| tab.view) {
                    self.switch_to(view, cursor);
                }
            }
            Key::Enter => self.open_detail(cursor),
            _ => {}
        }
    }

    /// Run the exit hook of the current view, then the enter hook of `to`.
    fn transition(&mut self, to: ViewId, cursor: &mut dyn CursorControl) {
        self.views.get_mut(self.current).on_exit(cursor);
        self.current = to;
        let view = self.views.get_mut(to);
        view.on_enter(cursor);
        tracing::debug!(view = ?view.id(), title = view.title(), "view changed");
    }

    fn switch_to(&mut self, id: ViewId, cursor: &mut dyn CursorControl) {
        if self.current == id {
            return;
        }
        self.previous = self.current;
        self.transition(id, cursor);
        self.tab_bar.set_active_by_id(id);
    }

    fn go_back(&mut self, cursor: &mut dyn CursorControl) {
        let target = self.previous;
        self.transition(target, cursor);
    }

    fn open_detail(&mut self, cursor: &mut dyn CursorControl) {
        let target = match self.current {
            ViewId::Boards => match self.views.selected_work_item().cloned() {
                Some(item) => {
                    self.views.show_work_item(item);
                    ViewId::WorkItemDetail
                }
                None => return,
            },
            ViewId::PullRequests => match self.views.selected_pull_request().cloned() {
                Some(pr) => {
                    self.views.show_pull_request(pr);
                    ViewId::PrDetail
                }
                None => return,
            },
            _ => return,
        };
        self.previous = self.current;
        self.transition(target, cursor);
    }

    fn help_text(&self) -> &'static str {
        if self.current == ViewId::Copilot {
            HELP_COPILOT
        } else if self.current.is_detail() {
            HELP_DETAIL
        } else if self.views.get(self.current).is_filter_mode() {
            HELP_FILTER
        } else {
            HELP_DEFAULT
        }
    }

    /// Full repaint of the screen into `frame`.
    ///
    /// Takes the snapshot read lock for the duration of the view draw, so it
    /// must not be called from inside an async task.
    pub fn render(&mut self, frame: &mut Frame) {
        let rows = frame.rows();
        let width = frame.cols();
        frame.clear();

        frame.print_at(
            1,
            center_offset(TITLE, width as usize) as u16 + 1,
            &style(TITLE, &[Attr::Bold, Attr::FgCyan]),
        );
        let location_col = width
            .saturating_sub(display_width(&self.location) as u16 + 1)
            .max(1);
        frame.print_at(1, location_col, &style(&self.location, &[Attr::Dim]));

        if !self.current.is_detail() {
            self.tab_bar.render(frame, TAB_ROW, 1, width);
        }

        let content_height = rows.saturating_sub(CHROME_ROWS);
        {
            let snapshot = self.snapshot.blocking_read();
            if snapshot.loading {
                frame.print_at(
                    CONTENT_ROW + content_height / 2,
                    (width / 2).saturating_sub(10).max(1),
                    &style("⏳ Loading...", &[Attr::FgYellow, Attr::Bold]),
                );
            } else {
                self.views
                    .get_mut(self.current)
                    .render(frame, &snapshot, CONTENT_ROW, width, content_height);
            }
        }

        let help = self.help_text();
        self.status_bar.set_help(help);
        self.status_bar.render(frame, rows.saturating_sub(2), width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use apo_core::agent::AskResult;
    use apo_core::reducer::{DataEvent, reduce_all};
    use apo_core::state::DataSnapshot;
    use chrono::Local;
    use tokio::runtime::Runtime;

    use crate::client::FakeSource;

    struct Echo;

    impl QueryService for Echo {
        fn ask(&self, query: &str) -> AskResult {
            AskResult {
                success: true,
                message: query.to_string(),
                ..Default::default()
            }
        }
    }

    #[derive(Default)]
    struct CursorLog(Vec<bool>);

    impl CursorControl for CursorLog {
        fn set_cursor_visible(&mut self, visible: bool) {
            self.0.push(visible);
        }
    }

    fn app_with(runtime: &Runtime, source: FakeSource) -> (App, SharedSnapshot) {
        let snapshot = DataSnapshot::shared();
        let (refresher, done) = Refresher::new(
            Arc::new(source),
            snapshot.clone(),
            runtime.handle().clone(),
        );
        let context = DetailContext {
            organization: "contoso".into(),
            project: "web".into(),
        };
        let app = App::new(context, Box::new(Echo), snapshot.clone(), refresher, done);
        (app, snapshot)
    }

    fn runtime() -> Runtime {
        Runtime::new().unwrap()
    }

    fn press(app: &mut App, cursor: &mut CursorLog, keys: &[Key]) {
        for key in keys {
            app.handle_key(*key, cursor);
        }
    }

    fn render(app: &mut App) -> String {
        let mut frame = Frame::new(40, 120);
        app.render(&mut frame);
        frame.plain_text()
    }

    /// Put fake data into the snapshot without going through a refresh.
    fn seed(runtime: &Runtime, snapshot: &SharedSnapshot) {
        let source = FakeSource::new();
        let (items, prs) = runtime.block_on(async {
            use apo_core::source::DataSource;
            (
                source.fetch_my_work_items().await.unwrap(),
                source.fetch_active_pull_requests(20).await.unwrap(),
            )
        });
        let events = [
            DataEvent::WorkItemsLoaded { items },
            DataEvent::PullRequestsLoaded { pull_requests: prs },
            DataEvent::RefreshFinished { at: Local::now() },
        ];
        reduce_all(&mut snapshot.blocking_write(), &events);
    }

    #[test]
    fn test_escape_from_copilot_goes_to_dashboard() {
        let rt = runtime();
        let (mut app, _) = app_with(&rt, FakeSource::new());
        let mut cursor = CursorLog::default();

        press(&mut app, &mut cursor, &[Key::Char('2')]);
        assert_eq!(app.current(), ViewId::Boards);
        press(&mut app, &mut cursor, &[Key::Char('f'), Key::Escape]);
        press(&mut app, &mut cursor, &[Key::Char(':')]);
        assert_eq!(app.current(), ViewId::Copilot);
        assert_eq!(app.previous(), ViewId::Boards);

        press(&mut app, &mut cursor, &[Key::Escape]);
        assert_eq!(app.current(), ViewId::Dashboard);
        assert_eq!(cursor.0, vec![true, false]);
    }

    #[test]
    fn test_copilot_swallows_global_letters() {
        let rt = runtime();
        let (mut app, _) = app_with(&rt, FakeSource::new());
        let mut cursor = CursorLog::default();

        let keys = [Key::Char('/'), Key::Char('q'), Key::Char('1')];
        press(&mut app, &mut cursor, &keys);
        assert!(app.is_running());
        assert_eq!(app.current(), ViewId::Copilot);

        press(&mut app, &mut cursor, &[Key::Interrupt]);
        assert!(!app.is_running());
    }

    #[test]
    fn test_tab_cycles_top_level_views() {
        let rt = runtime();
        let (mut app, _) = app_with(&rt, FakeSource::new());
        let mut cursor = CursorLog::default();

        press(&mut app, &mut cursor, &[Key::Tab]);
        assert_eq!(app.current(), ViewId::Boards);
        for _ in 0..4 {
            press(&mut app, &mut cursor, &[Key::Tab]);
        }
        assert_eq!(app.current(), ViewId::Copilot);
        // Copilot declines Tab, so it wraps back to the first tab
        press(&mut app, &mut cursor, &[Key::Tab]);
        assert_eq!(app.current(), ViewId::Dashboard);
    }

    #[test]
    fn test_enter_opens_detail_and_back_returns() {
        let rt = runtime();
        let (mut app, snapshot) = app_with(&rt, FakeSource::new());
        let mut cursor = CursorLog::default();
        seed(&rt, &snapshot);

        press(&mut app, &mut cursor, &[Key::Char('2')]);
        render(&mut app);
        press(&mut app, &mut cursor, &[Key::Down, Key::Enter]);
        assert_eq!(app.current(), ViewId::WorkItemDetail);
        assert_eq!(app.previous(), ViewId::Boards);
        let text = render(&mut app);
        assert!(text.contains("#4087"));
        assert!(!text.contains("Dashboard [1]"));
        assert!(text.contains(HELP_DETAIL));

        // shortcuts are ignored on detail views
        press(&mut app, &mut cursor, &[Key::Char('3'), Key::Tab]);
        assert_eq!(app.current(), ViewId::WorkItemDetail);

        press(&mut app, &mut cursor, &[Key::Char('b')]);
        assert_eq!(app.current(), ViewId::Boards);

        press(&mut app, &mut cursor, &[Key::Char('5')]);
        render(&mut app);
        press(&mut app, &mut cursor, &[Key::Enter]);
        assert_eq!(app.current(), ViewId::PrDetail);
        press(&mut app, &mut cursor, &[Key::Escape]);
        assert_eq!(app.current(), ViewId::PullRequests);
    }

    #[test]
    fn test_enter_on_empty_list_stays() {
        let rt = runtime();
        let (mut app, _) = app_with(&rt, FakeSource::new());
        let mut cursor = CursorLog::default();

        press(&mut app, &mut cursor, &[Key::Char('2')]);
        assert!(render(&mut app).contains("No items"));
        press(&mut app, &mut cursor, &[Key::Enter]);
        assert_eq!(app.current(), ViewId::Boards);
    }

    #[test]
    fn test_filter_mode_intercepts_escape_and_keys() {
        let rt = runtime();
        let (mut app, snapshot) = app_with(&rt, FakeSource::new());
        let mut cursor = CursorLog::default();
        seed(&rt, &snapshot);

        press(&mut app, &mut cursor, &[Key::Char('2')]);
        render(&mut app);
        let keys = [Key::Char('f'), Key::Char('q'), Key::Char('3')];
        press(&mut app, &mut cursor, &keys);
        assert!(app.is_running());
        assert_eq!(app.current(), ViewId::Boards);
        assert!(render(&mut app).contains(HELP_FILTER));

        press(&mut app, &mut cursor, &[Key::Escape]);
        assert_eq!(app.current(), ViewId::Boards);
        assert!(render(&mut app).contains(HELP_DEFAULT));

        press(&mut app, &mut cursor, &[Key::Char('q')]);
        assert!(!app.is_running());
    }

    #[test]
    fn test_render_chrome() {
        let rt = runtime();
        let (mut app, snapshot) = app_with(&rt, FakeSource::new());
        let mut cursor = CursorLog::default();

        let text = render(&mut app);
        assert!(text.contains(TITLE));
        assert!(text.contains("contoso/web"));
        assert!(text.contains("Dashboard [1]"));
        assert!(text.contains(HELP_DEFAULT));

        press(&mut app, &mut cursor, &[Key::Char('/')]);
        assert!(render(&mut app).contains(HELP_COPILOT));

        snapshot.blocking_write().loading = true;
        let text = render(&mut app);
        assert!(text.contains("⏳ Loading..."));
        assert!(!text.contains("🤖 Copilot - Ask me"));
    }

    #[test]
    fn test_refresh_status_messages() {
        let rt = runtime();
        let source = FakeSource::new().with_latency(Duration::from_millis(100));
        let (mut app, snapshot) = app_with(&rt, source);
        let mut cursor = CursorLog::default();

        app.start(&mut cursor);
        assert_eq!(
            app.status_bar().visible_message(Instant::now()),
            Some("Loading...")
        );

        press(&mut app, &mut cursor, &[Key::Char('r')]);
        assert_eq!(
            app.status_bar().visible_message(Instant::now()),
            Some("Refresh already in progress")
        );

        for _ in 0..200 {
            app.drain_refresh();
            if app.status_bar().visible_message(Instant::now()) == Some("Data refreshed") {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(
            app.status_bar().visible_message(Instant::now()),
            Some("Data refreshed")
        );
        assert_eq!(snapshot.blocking_read().generation, 1);
        assert!(render(&mut app).contains("Last refresh: "));

        press(&mut app, &mut cursor, &[Key::Char('r')]);
        assert_eq!(
            app.status_bar().visible_message(Instant::now()),
            Some("Refreshing...")
        );
    }
}
