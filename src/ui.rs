use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use quantrank::{
    CareerRegistry, CategoryFilter, Comment, CommentPhase, Dispatcher, Firm, FirmDetail, FirmId,
    FirmType, FirmView, Job, MatchupController, Outcome, Sentiment, SharedApi, Side, StatsPhase,
    UnavailableReason, VoteResult, VoteState, WinRateTier,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::borrow::Cow;
use std::io;
use std::time::Duration;
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Matchup,
    Firms,
    Detail,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Matchup => Page::Firms,
            Page::Firms => Page::Detail,
            Page::Detail => Page::Matchup,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Matchup => Page::Detail,
            Page::Firms => Page::Matchup,
            Page::Detail => Page::Firms,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Matchup => "Matchup",
            Page::Firms => "All Firms",
            Page::Detail => "Firm Detail",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

pub struct App {
    pub controller: MatchupController,
    dispatcher: Dispatcher,
    careers: CareerRegistry,
    pub current_page: Page,
    pub firms: Vec<Firm>,
    pub filtered_firms: Vec<Firm>,
    pub filter: CategoryFilter,
    pub state: TableState,
    pub firms_status: LoadStatus,
    firms_request: u64,
    pub detail: Option<FirmView>,
    detail_request: Option<FirmId>,
    pub flash: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(api: SharedApi, careers: CareerRegistry, recent_comments: usize) -> Self {
        Self {
            controller: MatchupController::new(recent_comments),
            dispatcher: Dispatcher::new(api),
            careers,
            current_page: Page::Matchup,
            firms: Vec::new(),
            filtered_firms: Vec::new(),
            filter: CategoryFilter::All,
            state: TableState::default(),
            firms_status: LoadStatus::Loading,
            firms_request: 0,
            detail: None,
            detail_request: None,
            flash: None,
            should_quit: false,
        }
    }

    /// Kick off the first matchup and the firm list
    pub fn start(&mut self) {
        self.next_matchup();
        self.refresh_firms();
    }

    // ------------------------------------------------------------------------
    // Vote flow
    // ------------------------------------------------------------------------

    pub fn next_matchup(&mut self) {
        match self.controller.request_matchup() {
            Ok(command) => self.dispatcher.dispatch(Job::Vote(command)),
            Err(e) => self.flash = Some(e.to_string()),
        }
    }

    pub fn pick(&mut self, side: Side) {
        match self.controller.pick(side) {
            Ok(command) => self.dispatcher.dispatch(Job::Vote(command)),
            Err(e) => self.flash = Some(e.to_string()),
        }
    }

    pub fn submit_comment(&mut self) {
        match self.controller.submit_draft() {
            Ok(Some(command)) => self.dispatcher.dispatch(Job::Vote(command)),
            Ok(None) => {}
            Err(e) => self.flash = Some(e.to_string()),
        }
    }

    fn vote_result(&self) -> Option<&VoteResult> {
        match self.controller.state() {
            VoteState::Result(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_editing_comment(&self) -> bool {
        self.current_page == Page::Matchup
            && matches!(
                self.vote_result().map(|r| &r.comment),
                Some(CommentPhase::Editing { .. })
            )
    }

    fn draft(&self) -> String {
        match self.vote_result().map(|r| &r.comment) {
            Some(CommentPhase::Editing { draft, .. }) => draft.clone(),
            _ => String::new(),
        }
    }

    pub fn open_winner_careers(&mut self) {
        let Some(winner) = self.vote_result().map(|r| r.winner.name.clone()) else {
            return;
        };
        let Some(url) = self.careers.lookup(&winner).map(str::to_string) else {
            self.flash = Some(format!("No careers page on file for {}", winner));
            return;
        };
        match open::that(&url) {
            Ok(()) => info!(%url, "Opened careers page"),
            Err(e) => {
                warn!(%url, error = %e, "Could not open careers page");
                self.flash = Some(format!("Could not open {}", url));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Firms list + detail
    // ------------------------------------------------------------------------

    /// Totals move with every vote, so the list is refetched whenever shown
    pub fn refresh_firms(&mut self) {
        self.firms_request += 1;
        self.firms_status = LoadStatus::Loading;
        self.dispatcher.dispatch(Job::Firms(self.firms_request));
    }

    pub fn show_page(&mut self, page: Page) {
        let entering_firms = page == Page::Firms && self.current_page != Page::Firms;
        self.current_page = page;
        if entering_firms {
            self.refresh_firms();
        }
    }

    pub fn apply_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
        self.filtered_firms = quantrank::filter_firms(&self.firms, &self.filter);

        // Reset selection to first item
        if !self.filtered_firms.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn selected_firm(&self) -> Option<&Firm> {
        self.state.selected().and_then(|i| self.filtered_firms.get(i))
    }

    pub fn open_firm(&mut self, id: FirmId) {
        self.detail = None;
        self.detail_request = Some(id);
        self.current_page = Page::Detail;
        self.dispatcher.dispatch(Job::Firm(id));
    }

    pub fn next(&mut self) {
        let len = self.filtered_firms.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered_firms.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    // ------------------------------------------------------------------------
    // Event plumbing
    // ------------------------------------------------------------------------

    /// Apply every finished request
    pub fn pump(&mut self) {
        for outcome in self.dispatcher.drain() {
            self.apply_outcome(outcome);
        }
    }

    /// Block for at most `timeout` on one outcome; true if one was applied
    pub fn pump_wait(&mut self, timeout: Duration) -> bool {
        match self.dispatcher.wait(timeout) {
            Some(outcome) => {
                self.apply_outcome(outcome);
                true
            }
            None => false,
        }
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Vote(completion) => {
                if let Some(command) = self.controller.complete(completion) {
                    self.dispatcher.dispatch(Job::Vote(command));
                }
            }
            Outcome::Firms(seq, _) if seq != self.firms_request => {
                debug!(seq, latest = self.firms_request, "Discarding stale firm list");
            }
            Outcome::Firms(_, Ok(firms)) => {
                self.firms = firms;
                self.firms_status = LoadStatus::Ready;
                let filter = self.filter.clone();
                self.apply_filter(filter);
            }
            Outcome::Firms(_, Err(e)) => {
                warn!(error = %e, "Could not load firms");
                self.firms_status = LoadStatus::Failed(e.to_string());
            }
            Outcome::Firm(id, view) => {
                if self.detail_request == Some(id) {
                    self.detail = Some(view);
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.is_editing_comment() {
            self.handle_comment_key(key);
            return;
        }

        self.flash = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.show_page(self.current_page.previous());
                } else {
                    self.show_page(self.current_page.next());
                }
                return;
            }
            KeyCode::BackTab => {
                self.show_page(self.current_page.previous());
                return;
            }
            _ => {}
        }

        match self.current_page {
            Page::Matchup => self.handle_matchup_key(key),
            Page::Firms => self.handle_firms_key(key),
            Page::Detail => self.handle_detail_key(key),
        }
    }

    fn handle_comment_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.controller.close_comment(),
            KeyCode::Enter => self.submit_comment(),
            KeyCode::Backspace => {
                let mut draft = self.draft();
                draft.pop();
                self.controller.update_draft(&draft);
            }
            KeyCode::Char(c) => {
                let mut draft = self.draft();
                draft.push(c);
                self.controller.update_draft(&draft);
            }
            _ => {}
        }
    }

    fn handle_matchup_key(&mut self, key: KeyEvent) {
        match self.controller.state() {
            VoteState::Presenting { .. } | VoteState::Submitting { .. } => match key.code {
                KeyCode::Char('1') | KeyCode::Left => self.pick(Side::Left),
                KeyCode::Char('2') | KeyCode::Right => self.pick(Side::Right),
                KeyCode::Char('s') => self.next_matchup(),
                _ => {}
            },
            VoteState::Result(outcome) => {
                let winner_id = outcome.winner.id;
                match key.code {
                    KeyCode::Char('n') | KeyCode::Enter => self.next_matchup(),
                    KeyCode::Char('c') => self.controller.open_comment(),
                    KeyCode::Char('d') => self.open_firm(winner_id),
                    KeyCode::Char('o') => self.open_winner_careers(),
                    _ => {}
                }
            }
            VoteState::Idle | VoteState::Unavailable { .. } => {
                if matches!(key.code, KeyCode::Char('r') | KeyCode::Enter) {
                    self.next_matchup();
                }
            }
            VoteState::Loading { .. } => {}
        }
    }

    fn handle_firms_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Char('r') => self.refresh_firms(),
            KeyCode::Enter => {
                if let Some(id) = self.selected_firm().map(|f| f.id) {
                    self.open_firm(id);
                }
            }
            KeyCode::Char(c @ '0'..='6') => {
                let index = c as usize - '0' as usize;
                if let Some(filter) = CategoryFilter::tabs().into_iter().nth(index) {
                    self.apply_filter(filter);
                }
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => {
                if let Some(id) = self.detail_request {
                    self.open_firm(id);
                }
            }
            KeyCode::Char('b') | KeyCode::Backspace => self.show_page(Page::Firms),
            _ => {}
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    app.start();

    while !app.should_quit {
        app.pump();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
    }

    Ok(())
}

// ============================================================================
// RENDERING
// ============================================================================

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Matchup => render_matchup(f, chunks[1], app),
        Page::Firms => render_firms(f, chunks[1], app),
        Page::Detail => render_detail(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn firm_type_color(firm_type: &FirmType) -> Color {
    match firm_type {
        FirmType::HedgeFund => Color::Blue,
        FirmType::TradingFirm => Color::Red,
        FirmType::GlobalBank => Color::Yellow,
        FirmType::Bank => Color::LightYellow,
        FirmType::AssetManager => Color::Cyan,
        FirmType::FinTech => Color::Magenta,
        FirmType::Other(_) => Color::Gray,
    }
}

fn tier_color(tier: Option<WinRateTier>) -> Color {
    match tier {
        Some(WinRateTier::Strong) => Color::Green,
        Some(WinRateTier::Even) => Color::Yellow,
        Some(WinRateTier::Weak) => Color::Red,
        None => Color::DarkGray,
    }
}

fn label<'a>(text: impl Into<Cow<'a, str>>) -> Span<'a> {
    Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
}

fn hint<'a>(text: impl Into<Cow<'a, str>>) -> Span<'a> {
    Span::styled(
        text,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Matchup, Page::Firms, Page::Detail];

    let mut tab_spans = vec![Span::styled(
        " QuantRank ",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )];
    for page in pages.iter() {
        tab_spans.push(Span::raw(" │ "));
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Firms: {}", app.firms.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

// ----------------------------------------------------------------------------
// Matchup page
// ----------------------------------------------------------------------------

fn render_matchup(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Which would you rather work at? ");

    match app.controller.state() {
        VoteState::Idle | VoteState::Loading { .. } => {
            let loading = Paragraph::new(vec![Line::from(""), Line::from("Loading matchup...")])
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(loading, area);
        }
        VoteState::Unavailable { reason } => {
            let headline = match reason {
                UnavailableReason::NotEnoughFirms => "Not enough firms for a matchup".to_string(),
                UnavailableReason::Transport(e) => format!("Could not load a matchup: {}", e),
            };
            let content = vec![
                Line::from(""),
                Line::from(Span::styled(
                    headline,
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::raw("Press "),
                    Span::styled("r", Style::default().fg(Color::Yellow)),
                    Span::raw(" to try again"),
                ]),
            ];
            let paragraph = Paragraph::new(content)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            f.render_widget(paragraph, area);
        }
        VoteState::Presenting { matchup, notice } => {
            render_versus(f, area, block, matchup.left(), matchup.right(), false, notice.as_deref());
        }
        VoteState::Submitting { matchup, .. } => {
            render_versus(f, area, block, matchup.left(), matchup.right(), true, None);
        }
        VoteState::Result(outcome) => render_result(f, area, block, app, outcome),
    }
}

fn render_versus(
    f: &mut Frame,
    area: Rect,
    block: Block,
    left: &Firm,
    right: &Firm,
    submitting: bool,
    notice: Option<&str>,
) {
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(inner);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(10),
            Constraint::Percentage(45),
        ])
        .split(rows[0]);

    render_firm_card(f, columns[0], left, "1", submitting);
    let versus = Paragraph::new(vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "VS",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(versus, columns[1]);
    render_firm_card(f, columns[2], right, "2", submitting);

    let footer = if submitting {
        Line::from(Span::styled("Submitting vote...", Style::default().fg(Color::Yellow)))
    } else if let Some(notice) = notice {
        Line::from(Span::styled(notice.to_string(), Style::default().fg(Color::Red)))
    } else {
        Line::from(hint("s: skip this matchup"))
    };
    f.render_widget(Paragraph::new(footer).alignment(Alignment::Center), rows[1]);
}

fn render_firm_card(f: &mut Frame, area: Rect, firm: &Firm, key: &str, disabled: bool) {
    let border = if disabled { Color::DarkGray } else { Color::Green };
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            firm.name.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            firm.firm_type.as_str().to_string(),
            Style::default().fg(firm_type_color(&firm.firm_type)),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled(key.to_string(), Style::default().fg(Color::Yellow)),
            Span::raw(" to pick"),
        ]),
    ];

    let card = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(border)));
    f.render_widget(card, area);
}

fn render_result(f: &mut Frame, area: Rect, block: Block, app: &App, outcome: &VoteResult) {
    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  You picked "),
            Span::styled(
                outcome.winner.name.clone(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" over "),
            Span::styled(outcome.loser.name.clone(), Style::default().fg(Color::Red)),
        ]),
        Line::from(""),
    ];

    match &outcome.stats {
        StatsPhase::Loading { .. } => content.push(Line::from(hint("  Loading stats..."))),
        StatsPhase::Unavailable => content.push(Line::from(hint("  Stats unavailable right now"))),
        StatsPhase::Ready(detail) => {
            content.extend(stat_lines(&detail.firm));
            content.push(Line::from(""));
            if detail.comments.is_empty() {
                content.push(Line::from(hint("  No comments yet")));
            } else {
                content.push(Line::from(label("  What people say")));
                for comment in &detail.comments {
                    content.push(comment_line(comment));
                }
            }
        }
    }

    content.push(Line::from(""));
    match &outcome.comment {
        CommentPhase::Closed => content.push(Line::from(hint("  c: add a comment to your vote"))),
        CommentPhase::Editing { draft, notice } => {
            content.push(Line::from(vec![
                label("  Why? "),
                Span::styled(format!("{}▏", draft), Style::default().fg(Color::White)),
            ]));
            if let Some(notice) = notice {
                content.push(Line::from(Span::styled(
                    format!("  {}", notice),
                    Style::default().fg(Color::Red),
                )));
            }
            content.push(Line::from(hint("  Enter: submit  Esc: cancel")));
        }
        CommentPhase::Pending { .. } => content.push(Line::from(hint("  Saving comment..."))),
        CommentPhase::Submitted => content.push(Line::from(Span::styled(
            "  ✓ Comment saved",
            Style::default().fg(Color::Green),
        ))),
    }

    content.push(Line::from(""));
    let mut actions = vec![
        Span::styled("  n", Style::default().fg(Color::Yellow)),
        Span::raw(" next matchup  "),
        Span::styled("d", Style::default().fg(Color::Yellow)),
        Span::raw(format!(" view {}", outcome.winner.name)),
    ];
    if app.careers.lookup(&outcome.winner.name).is_some() {
        actions.push(Span::raw("  "));
        actions.push(Span::styled("o", Style::default().fg(Color::Yellow)));
        actions.push(Span::raw(format!(" {} careers", outcome.winner.name)));
    }
    content.push(Line::from(actions));

    let paragraph = Paragraph::new(content).wrap(Wrap { trim: false }).block(block);
    f.render_widget(paragraph, area);
}

fn stat_lines(firm: &Firm) -> Vec<Line<'static>> {
    if !firm.has_votes() {
        return vec![
            Line::from(hint("  No data available")),
            Line::from(hint("  Be the first to vote!")),
        ];
    }
    vec![
        Line::from(vec![
            label("  Win Rate: "),
            Span::styled(
                format!("{}%", firm.win_rate()),
                Style::default()
                    .fg(tier_color(firm.tier()))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            label("  Wins: "),
            Span::raw(firm.wins.to_string()),
            label("   Losses: "),
            Span::raw(firm.losses.to_string()),
            label("   Total Votes: "),
            Span::raw(firm.total.to_string()),
        ]),
    ]
}

fn comment_line(comment: &Comment) -> Line<'static> {
    let color = match comment.sentiment {
        Sentiment::Picked => Color::Green,
        Sentiment::Passed => Color::Red,
    };
    let mut spans = vec![
        Span::raw("  "),
        Span::styled(comment.sentiment.badge(), Style::default().fg(color)),
    ];
    if let Some(other) = &comment.other_firm {
        spans.push(Span::styled(format!(" vs {}", other), Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::raw(format!("  \"{}\"", comment.text)));
    if let Some(posted) = comment.posted_at() {
        spans.push(Span::styled(
            format!("  {}", posted.format("%Y-%m-%d")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

// ----------------------------------------------------------------------------
// Firms page
// ----------------------------------------------------------------------------

fn render_firms(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let mut filter_spans = vec![];
    for (i, tab) in CategoryFilter::tabs().iter().enumerate() {
        if i > 0 {
            filter_spans.push(Span::raw(" "));
        }
        filter_spans.push(Span::styled(format!("{}", i), Style::default().fg(Color::Yellow)));
        let style = if *tab == app.filter {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        filter_spans.push(Span::styled(format!(" {}", tab.label()), style));
    }
    let filters = Paragraph::new(Line::from(filter_spans))
        .block(Block::default().borders(Borders::ALL).title(" Filter "));
    f.render_widget(filters, chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" All Firms ");

    match &app.firms_status {
        // A refresh keeps showing the previous list until it lands
        LoadStatus::Loading if app.firms.is_empty() => {
            f.render_widget(Paragraph::new("Loading firms...").block(block), chunks[1]);
            return;
        }
        LoadStatus::Failed(e) => {
            let content = vec![
                Line::from(Span::styled(format!("Could not load firms: {}", e), Style::default().fg(Color::Red))),
                Line::from(hint("r: retry")),
            ];
            f.render_widget(Paragraph::new(content).wrap(Wrap { trim: true }).block(block), chunks[1]);
            return;
        }
        LoadStatus::Loading | LoadStatus::Ready => {}
    }

    if app.filtered_firms.is_empty() {
        let content = vec![
            Line::from(""),
            Line::from(Span::styled("No firms found", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(hint("Try adjusting your filter")),
        ];
        f.render_widget(
            Paragraph::new(content).alignment(Alignment::Center).block(block),
            chunks[1],
        );
        return;
    }

    let header_cells = ["Firm", "Type", "Win Rate", "Wins", "Losses", "Total Votes"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_firms.iter().map(|firm| {
        let rate = if firm.has_votes() {
            Cell::from(format!("{}%", firm.win_rate())).style(Style::default().fg(tier_color(firm.tier())))
        } else {
            Cell::from("No data").style(Style::default().fg(Color::DarkGray))
        };

        let cells = vec![
            Cell::from(truncate(&firm.name, 32)),
            Cell::from(firm.firm_type.as_str().to_string())
                .style(Style::default().fg(firm_type_color(&firm.firm_type))),
            rate,
            Cell::from(firm.wins.to_string()),
            Cell::from(firm.losses.to_string()),
            Cell::from(firm.total.to_string()),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(34),
            Constraint::Length(15),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.state);
}

// ----------------------------------------------------------------------------
// Detail page
// ----------------------------------------------------------------------------

fn render_detail(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Firm Details ");

    let detail = match (&app.detail, app.detail_request) {
        (Some(FirmView::Found(detail)), _) => detail,
        (Some(FirmView::NotFound(id)), _) => {
            let content = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Firm not found",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(hint(format!("No firm with id {}", id))),
                Line::from(hint("b: back to all firms")),
            ];
            f.render_widget(Paragraph::new(content).alignment(Alignment::Center).block(block), area);
            return;
        }
        (Some(FirmView::Unavailable(e)), _) => {
            let content = vec![
                Line::from(Span::styled(format!("Could not load firm: {}", e), Style::default().fg(Color::Red))),
                Line::from(hint("r: retry")),
            ];
            f.render_widget(Paragraph::new(content).wrap(Wrap { trim: true }).block(block), area);
            return;
        }
        (None, Some(_)) => {
            f.render_widget(Paragraph::new("Loading firm...").block(block), area);
            return;
        }
        (None, None) => {
            f.render_widget(
                Paragraph::new(hint("Select a firm on the All Firms page")).block(block),
                area,
            );
            return;
        }
    };

    render_firm_detail(f, area, block, detail);
}

fn render_firm_detail(f: &mut Frame, area: Rect, block: Block, detail: &FirmDetail) {
    let firm = &detail.firm;
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Length(3), Constraint::Min(0)])
        .split(inner);

    let mut summary = vec![
        Line::from(vec![
            Span::styled(
                format!("  {}", firm.name),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                firm.firm_type.as_str().to_string(),
                Style::default().fg(firm_type_color(&firm.firm_type)),
            ),
        ]),
        Line::from(""),
    ];
    summary.extend(stat_lines(firm));
    f.render_widget(Paragraph::new(summary), chunks[0]);

    if firm.has_votes() {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Win Rate "))
            .gauge_style(Style::default().fg(tier_color(firm.tier())))
            .ratio((firm.win_rate() / 100.0).clamp(0.0, 1.0))
            .label(format!("{}%", firm.win_rate()));
        f.render_widget(gauge, chunks[1]);
    }

    let mut comments = vec![Line::from(label("  What people say"))];
    if detail.comments.is_empty() {
        comments.push(Line::from(hint(format!(
            "  Be the first to share your thoughts on {}",
            firm.name
        ))));
    } else {
        comments.extend(detail.comments.iter().map(comment_line));
    }
    f.render_widget(Paragraph::new(comments).wrap(Wrap { trim: false }), chunks[2]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(flash) = &app.flash {
        status_spans.push(Span::styled(format!(" {} ", flash), Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" | "));
    }

    let keys: &[(&str, &str)] = match app.current_page {
        Page::Matchup if app.is_editing_comment() => &[("Enter", "Submit"), ("Esc", "Cancel")],
        Page::Matchup => &[("1/2", "Pick"), ("s", "Skip"), ("n", "Next"), ("c", "Comment")],
        Page::Firms => &[("0-6", "Filter"), ("↑/↓", "Nav"), ("Enter", "Details"), ("r", "Refresh")],
        Page::Detail => &[("b", "Back"), ("r", "Reload")],
    };
    for (key, action) in keys {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(format!(" {} | ", action)));
    }
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use quantrank::{Ballot, CommentReceipt, RankingApi, VoteId};
    use ratatui::backend::TestBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const WAIT: Duration = Duration::from_secs(5);

    struct StubApi {
        firms: Vec<Firm>,
        firms_calls: AtomicUsize,
    }

    impl StubApi {
        fn with_firms(firms: Vec<Firm>) -> Self {
            Self {
                firms,
                firms_calls: AtomicUsize::new(0),
            }
        }

        fn pair() -> Self {
            Self::with_firms(vec![
                Firm::new(1, "Jane Street", FirmType::TradingFirm).with_record(6, 2),
                Firm::new(2, "Citadel", FirmType::HedgeFund).with_record(2, 6),
                Firm::new(3, "Goldman Sachs", FirmType::GlobalBank),
            ])
        }
    }

    impl RankingApi for StubApi {
        fn matchup(&self) -> quantrank::Result<Vec<Firm>> {
            Ok(self.firms.iter().take(2).cloned().collect())
        }

        fn firms(&self) -> quantrank::Result<Vec<Firm>> {
            self.firms_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.firms.clone())
        }

        fn firm(&self, id: FirmId) -> quantrank::Result<Option<FirmDetail>> {
            Ok(self.firms.iter().find(|f| f.id == id).map(|firm| FirmDetail {
                firm: firm.clone(),
                comments: Vec::new(),
            }))
        }

        fn vote(&self, _ballot: &Ballot) -> quantrank::Result<VoteId> {
            Ok(VoteId(7))
        }

        fn comment(&self, _vote_id: VoteId, _text: &str) -> quantrank::Result<CommentReceipt> {
            Ok(CommentReceipt::saved())
        }
    }

    fn app_with(api: StubApi) -> (App, Arc<StubApi>) {
        let api = Arc::new(api);
        let app = App::new(api.clone(), CareerRegistry::new(), 3);
        (app, api)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn to_result(app: &mut App, api: &StubApi) {
        let command = app.controller.request_matchup().unwrap();
        app.controller.drive(command, api);
        let command = app.controller.pick(Side::Left).unwrap();
        app.controller.drive(command, api);
    }

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_page_cycle() {
        assert_eq!(Page::Matchup.next(), Page::Firms);
        assert_eq!(Page::Detail.next(), Page::Matchup);
        assert_eq!(Page::Matchup.previous(), Page::Detail);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Citadel", 10), "Citadel");
        assert_eq!(truncate("Renaissance Technologies", 10), "Renaiss...");
    }

    #[test]
    fn test_render_not_enough_firms() {
        let (mut app, api) = app_with(StubApi::with_firms(vec![Firm::new(
            1,
            "Lonely Capital",
            FirmType::HedgeFund,
        )]));
        let command = app.controller.request_matchup().unwrap();
        app.controller.drive(command, api.as_ref());

        let screen = render(&mut app);
        assert!(screen.contains("Not enough firms"));
        assert!(screen.contains("to try again"));
        assert!(!screen.contains("VS"));
        assert!(!screen.contains("Lonely Capital"));
    }

    #[test]
    fn test_render_presenting() {
        let (mut app, api) = app_with(StubApi::pair());
        let command = app.controller.request_matchup().unwrap();
        app.controller.drive(command, api.as_ref());

        let screen = render(&mut app);
        assert!(screen.contains("Jane Street"));
        assert!(screen.contains("Citadel"));
        assert!(screen.contains("VS"));
    }

    #[test]
    fn test_render_result_with_stats() {
        let (mut app, api) = app_with(StubApi::pair());
        to_result(&mut app, api.as_ref());

        let screen = render(&mut app);
        assert!(screen.contains("You picked Jane Street over Citadel"));
        assert!(screen.contains("Win Rate: 75%"));
        assert!(screen.contains("No comments yet"));
        assert!(screen.contains("Jane Street careers"));
    }

    #[test]
    fn test_render_firm_not_found() {
        let (mut app, _api) = app_with(StubApi::pair());
        app.current_page = Page::Detail;
        app.detail_request = Some(FirmId(999));
        app.detail = Some(FirmView::NotFound(FirmId(999)));

        let screen = render(&mut app);
        assert!(screen.contains("Firm not found"));
    }

    #[test]
    fn test_render_firms_no_data() {
        let (mut app, api) = app_with(StubApi::pair());
        app.apply_outcome(Outcome::Firms(0, api.firms()));
        app.current_page = Page::Firms;

        let screen = render(&mut app);
        assert!(screen.contains("Goldman Sachs"));
        assert!(screen.contains("No data"));
    }

    #[test]
    fn test_comment_typing() {
        let (mut app, api) = app_with(StubApi::pair());
        to_result(&mut app, api.as_ref());

        press(&mut app, KeyCode::Char('c'));
        assert!(app.is_editing_comment());

        for c in "fun!".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.draft(), "fun");

        // 'q' is text while the box is open
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Esc);
        assert!(!app.is_editing_comment());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_comment_submit_through_worker() {
        let (mut app, api) = app_with(StubApi::pair());
        to_result(&mut app, api.as_ref());

        press(&mut app, KeyCode::Char('c'));
        for c in "great desk".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert!(matches!(
            app.vote_result().map(|r| &r.comment),
            Some(CommentPhase::Pending { .. })
        ));

        assert!(app.pump_wait(WAIT));
        assert_eq!(
            app.vote_result().map(|r| &r.comment),
            Some(&CommentPhase::Submitted)
        );
    }

    #[test]
    fn test_filter_keys() {
        let (mut app, api) = app_with(StubApi::pair());
        app.apply_outcome(Outcome::Firms(0, api.firms()));
        app.current_page = Page::Firms;
        assert_eq!(app.filtered_firms.len(), 3);

        // Tab 1 is Hedge Fund
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.filter, CategoryFilter::Only(FirmType::HedgeFund));
        assert_eq!(app.filtered_firms.len(), 1);
        assert_eq!(app.selected_firm().map(|f| f.name.as_str()), Some("Citadel"));

        press(&mut app, KeyCode::Char('6'));
        assert!(app.filtered_firms.is_empty());
        assert!(app.selected_firm().is_none());

        press(&mut app, KeyCode::Char('0'));
        assert_eq!(app.filtered_firms.len(), 3);
    }

    #[test]
    fn test_stale_firm_detail_ignored() {
        let (mut app, _api) = app_with(StubApi::pair());
        app.detail_request = Some(FirmId(2));

        app.apply_outcome(Outcome::Firm(FirmId(1), FirmView::NotFound(FirmId(1))));
        assert!(app.detail.is_none());

        app.apply_outcome(Outcome::Firm(FirmId(2), FirmView::NotFound(FirmId(2))));
        assert_eq!(app.detail, Some(FirmView::NotFound(FirmId(2))));
    }

    #[test]
    fn test_firms_refetched_after_vote() {
        let (mut app, api) = app_with(StubApi::pair());
        to_result(&mut app, api.as_ref());
        assert_eq!(api.firms_calls.load(Ordering::SeqCst), 0);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_page, Page::Firms);
        assert_eq!(app.firms_status, LoadStatus::Loading);
        assert!(app.pump_wait(WAIT));
        assert_eq!(app.firms_status, LoadStatus::Ready);
        assert_eq!(app.firms.len(), 3);
        assert_eq!(api.firms_calls.load(Ordering::SeqCst), 1);

        // Coming back to the list fetches again
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_page, Page::Firms);
        assert!(app.pump_wait(WAIT));
        assert_eq!(api.firms_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stale_firm_list_ignored() {
        let (mut app, api) = app_with(StubApi::pair());
        app.refresh_firms();
        app.refresh_firms();

        let older = vec![Firm::new(9, "Old Snapshot", FirmType::Bank)];
        app.apply_outcome(Outcome::Firms(1, Ok(older)));
        assert!(app.firms.is_empty());
        assert_eq!(app.firms_status, LoadStatus::Loading);

        app.apply_outcome(Outcome::Firms(2, api.firms()));
        assert_eq!(app.firms.len(), 3);
        assert_eq!(app.firms_status, LoadStatus::Ready);
    }

    #[test]
    fn test_quit_and_tab() {
        let (mut app, _api) = app_with(StubApi::pair());

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_page, Page::Firms);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_page, Page::Matchup);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
