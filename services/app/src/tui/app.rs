//! services/app/src/tui/app.rs
//!
//! Central application state and the event loop: render → select → update.
//! Completion events are route-guarded here so a response arriving after
//! its view was left is dropped instead of mutating a gone view.

use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, KeyCode, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use super::events::{AppEvent, Route, ViewResult};
use super::services::Services;
use super::theme::Palette;
use super::views::dashboard::DashboardView;
use super::views::detail::DetailView;
use super::views::favorites::FavoritesView;
use super::views::library::LibraryView;
use super::views::login::LoginView;
use super::views::register::RegisterView;
use super::views::settings::SettingsView;
use crate::state::toasts::{Toast, ToastKind};

pub struct App {
    running: bool,
    route: Route,
    services: Services,
    login: LoginView,
    register: RegisterView,
    dashboard: DashboardView,
    library: LibraryView,
    favorites: FavoritesView,
    detail: DetailView,
    settings: SettingsView,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(services: Services, event_rx: mpsc::UnboundedReceiver<AppEvent>) -> Self {
        Self {
            running: true,
            route: Route::Login,
            services,
            login: LoginView::new(),
            register: RegisterView::new(),
            dashboard: DashboardView::new(),
            library: LibraryView::new(),
            favorites: FavoritesView::new(),
            detail: DetailView::new(),
            settings: SettingsView::new(),
            event_rx,
        }
    }

    // ── Event loop ───────────────────────────────────────────────────────

    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        // Resolve a persisted token before anything renders as signed-out.
        let session = self.services.session.clone();
        let tx = self.services.event_tx.clone();
        tokio::spawn(async move {
            session.resolve_user().await;
            let _ = tx.send(AppEvent::SessionReady);
        });

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.services.toasts.prune();
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    // ── Event handling ───────────────────────────────────────────────────

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(raw) => self.handle_input(raw),
            AppEvent::SessionReady => {
                if self.services.session.is_authenticated() {
                    self.navigate(Route::Dashboard);
                } else {
                    self.route = Route::Login;
                }
            }
            AppEvent::LoginFinished { ok } => {
                self.login.on_login_finished(ok);
                if ok && self.services.session.is_authenticated() {
                    self.navigate(Route::Dashboard);
                }
            }
            AppEvent::RegisterFinished { ok } => {
                self.register.on_register_finished(ok);
                if ok {
                    self.route = Route::Login;
                }
            }
            AppEvent::LibraryLoaded { generation, result } => {
                self.library.on_loaded(generation, result, &self.services);
            }
            AppEvent::FavoritesLoaded { generation, result } => {
                self.favorites.on_loaded(generation, result);
            }
            AppEvent::StatsLoaded { result } => {
                // Only the dashboard shows stats; a response landing after
                // navigation is stale.
                if self.route == Route::Dashboard {
                    self.dashboard.on_stats_loaded(result);
                }
            }
            AppEvent::UploadFinished { result } => {
                self.dashboard.on_upload_finished(&result);
                match result {
                    Ok(document) => {
                        self.services
                            .toasts
                            .success(format!("\"{}\" uploaded", document.title));
                        match self.route {
                            Route::Dashboard => self.dashboard.load(&self.services),
                            Route::Library => self.library.load(&self.services),
                            _ => {}
                        }
                    }
                    Err(error) => {
                        let message = error
                            .detail()
                            .map(str::to_string)
                            .unwrap_or_else(|| "Could not upload the document".to_string());
                        self.services.toasts.error(message);
                    }
                }
            }
            AppEvent::DocumentDeleted {
                document_id,
                result,
            } => match result {
                Ok(()) => {
                    self.library.on_deleted(document_id);
                    self.favorites.on_deleted(document_id);
                    self.services.toasts.success("Document deleted");
                }
                Err(error) => {
                    let message = error
                        .detail()
                        .map(str::to_string)
                        .unwrap_or_else(|| "Could not delete the document".to_string());
                    self.services.toasts.error(message);
                }
            },
            AppEvent::DetailFetched { generation, result } => {
                if matches!(self.route, Route::Document(_)) {
                    self.detail
                        .on_detail_fetched(generation, result, &self.services);
                }
            }
            AppEvent::Poll(update) => {
                if matches!(self.route, Route::Document(id) if id == update.document_id) {
                    self.detail.on_poll(update, &self.services);
                }
            }
            AppEvent::HistoryLoaded {
                document_id,
                result,
            } => {
                if self.on_document_route(document_id) {
                    self.detail.on_history_loaded(result);
                }
            }
            AppEvent::ChatCompleted {
                document_id,
                seq,
                result,
            } => {
                if self.on_document_route(document_id) {
                    self.detail.on_chat_completed(seq, result);
                }
            }
            AppEvent::GlossaryReady {
                document_id,
                result,
            } => {
                if self.on_document_route(document_id) {
                    self.detail.on_glossary_ready(result);
                }
            }
            AppEvent::QuizReady {
                document_id,
                result,
            } => {
                if self.on_document_route(document_id) {
                    self.detail.on_quiz_ready(result);
                }
            }
            AppEvent::ExportFinished { result, .. } => match result {
                Ok(path) => {
                    self.services
                        .toasts
                        .success(format!("Chat exported to {}", path.display()));
                }
                Err(error) => {
                    tracing::warn!("chat export failed: {error}");
                    self.services.toasts.error("Could not export the chat");
                }
            },
            AppEvent::Quit => self.running = false,
        }
    }

    fn on_document_route(&self, document_id: i64) -> bool {
        matches!(self.route, Route::Document(id) if id == document_id)
    }

    fn handle_input(&mut self, raw: Event) {
        let Event::Key(key) = raw else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Ctrl+C always quits.
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return;
        }

        let snapshot = self.services.session.snapshot();
        if snapshot.loading {
            return;
        }

        if !snapshot.is_authenticated() {
            let result = match self.route {
                Route::Register => self.register.handle_input(key, &self.services),
                _ => self.login.handle_input(key, &self.services),
            };
            self.apply_view_result(result, key);
            return;
        }

        let result = match self.route {
            Route::Dashboard => self.dashboard.handle_input(key, &self.services),
            Route::Library => self.library.handle_input(key, &self.services),
            Route::Favorites => self.favorites.handle_input(key, &self.services),
            Route::Document(_) => self.detail.handle_input(key, &self.services),
            Route::Settings => self.settings.handle_input(key, &self.services),
            Route::Login | Route::Register => {
                self.navigate(Route::Dashboard);
                ViewResult::Consumed
            }
        };
        self.apply_view_result(result, key);
    }

    fn apply_view_result(&mut self, result: ViewResult, key: KeyEvent) {
        match result {
            ViewResult::Ignored => self.handle_global_key(key),
            ViewResult::Consumed => {}
            ViewResult::Goto(route) => self.navigate(route),
            ViewResult::Logout => self.logout(),
        }
    }

    fn handle_global_key(&mut self, key: KeyEvent) {
        if !self.services.session.is_authenticated() {
            return;
        }
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('l')) => self.logout(),
            (KeyModifiers::NONE, KeyCode::Char('1')) => self.navigate(Route::Dashboard),
            (KeyModifiers::NONE, KeyCode::Char('2')) => self.navigate(Route::Library),
            (KeyModifiers::NONE, KeyCode::Char('3')) => self.navigate(Route::Favorites),
            (KeyModifiers::NONE, KeyCode::Char('4')) => self.navigate(Route::Settings),
            (KeyModifiers::NONE, KeyCode::Char('q')) => self.running = false,
            _ => {}
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────

    fn navigate(&mut self, route: Route) {
        // Leaving the detail page cancels its polling deterministically.
        if matches!(self.route, Route::Document(_)) && self.route != route {
            self.detail.leave();
        }

        let route = if route.is_protected() && !self.services.session.is_authenticated() {
            Route::Login
        } else {
            route
        };
        self.route = route;

        match route {
            Route::Dashboard => self.dashboard.load(&self.services),
            Route::Library => self.library.load(&self.services),
            Route::Favorites => self.favorites.load(&self.services),
            Route::Document(id) => self.detail.enter(id, &self.services),
            Route::Settings => self.settings.load(&self.services),
            Route::Login | Route::Register => {}
        }
    }

    fn logout(&mut self) {
        self.detail.leave();
        self.services.session.logout();
        self.route = Route::Login;
    }

    // ── Render ───────────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let palette = Palette::for_preference(self.services.settings.theme());
        let area = frame.area();
        let snapshot = self.services.session.snapshot();

        // Suspend rendering of protected views while a persisted token is
        // resolving, instead of flashing the login page.
        if snapshot.loading {
            let line = Line::styled("DocLens — restoring your session…", palette.hint());
            frame.render_widget(
                Paragraph::new(line).alignment(ratatui::layout::Alignment::Center),
                Rect {
                    y: area.y + area.height / 2,
                    height: 1,
                    ..area
                },
            );
            return;
        }

        if !snapshot.is_authenticated() {
            match self.route {
                Route::Register => self.register.render(frame, area, &palette),
                _ => self.login.render(frame, area, &palette),
            }
            self.render_toasts(frame, area, &palette);
            return;
        }

        let rows = Layout::vertical([Constraint::Length(1), Constraint::Min(5)]).split(area);
        self.render_navbar(frame, rows[0], snapshot.user.as_ref(), &palette);
        match self.route {
            Route::Dashboard => self.dashboard.render(frame, rows[1], &palette),
            Route::Library => self.library.render(frame, rows[1], &self.services, &palette),
            Route::Favorites => self.favorites.render(frame, rows[1], &self.services, &palette),
            Route::Document(_) => self.detail.render(frame, rows[1], &palette),
            Route::Settings => self.settings.render(frame, rows[1], &palette),
            Route::Login | Route::Register => {}
        }
        self.render_toasts(frame, area, &palette);
    }

    fn render_navbar(
        &self,
        frame: &mut Frame,
        area: Rect,
        user: Option<&doclens_core::domain::User>,
        palette: &Palette,
    ) {
        let tabs = [
            (Route::Dashboard, "1 Dashboard"),
            (Route::Library, "2 Library"),
            (Route::Favorites, "3 Favorites"),
            (Route::Settings, "4 Settings"),
        ];
        let mut spans = vec![Span::styled(" DocLens ", palette.title())];
        for (route, label) in tabs {
            let active = self.route == route
                || (matches!(self.route, Route::Document(_)) && route == Route::Library);
            let style = if active {
                palette.title()
            } else {
                palette.hint()
            };
            spans.push(Span::styled(format!(" {label} "), style));
        }
        if let Some(user) = user {
            spans.push(Span::styled(
                format!("  {}", user.email),
                palette.hint(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_toasts(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let toasts = self.services.toasts.visible();
        if toasts.is_empty() {
            return;
        }

        // Bottom-right stack, newest closest to the edge, max 4 visible.
        for (offset, toast) in toasts.iter().rev().take(4).enumerate() {
            let width = (toast.message.chars().count() as u16 + 4)
                .min(area.width.saturating_sub(2))
                .max(10);
            let rect = Rect {
                x: area.right().saturating_sub(width + 1),
                y: area.bottom().saturating_sub(2 + offset as u16),
                width,
                height: 1,
            };
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::raw(" "),
                    Span::raw(toast_icon(toast)),
                    Span::raw(" "),
                    Span::raw(toast.message.clone()),
                ]))
                .style(Style::default().fg(Color::White).bg(toast_bg(toast, palette))),
                rect,
            );
        }
    }
}

fn toast_icon(toast: &Toast) -> &'static str {
    match toast.kind {
        ToastKind::Success => "✓",
        ToastKind::Error => "✗",
        ToastKind::Warning => "!",
        ToastKind::Info => "i",
    }
}

fn toast_bg(toast: &Toast, palette: &Palette) -> Color {
    match toast.kind {
        ToastKind::Success => palette.success,
        ToastKind::Error => palette.error,
        ToastKind::Warning => palette.warning,
        ToastKind::Info => palette.accent,
    }
}
