use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap};

use minecasino::games::baccarat::DrawRule;
use minecasino::games::cards::format_hand;
use minecasino::games::crash::FlightState;
use minecasino::games::dice::win_multiplier;
use minecasino::games::scratch::CELLS;
use minecasino::games::slots::{ROWS, SlotTheme};
use minecasino::games::{GameId, OutcomeDetail};
use minecasino::ledger::{Transaction, TransactionKind};
use minecasino::market::format_price_delta;
use minecasino::mining::PLANS;

use crate::app::{App, CasinoState, LiveTable, PaneFocus, format_duration, format_hashrate, local_time};

pub fn draw(f: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(f.size());

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[0]);

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main_chunks[1]);

    draw_casino(f, left_chunks[0], app);
    draw_market(f, left_chunks[1], app);
    draw_mining(f, right_chunks[0], app);
    draw_ledger(f, right_chunks[1], app);

    let footer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(chunks[1]);

    draw_ticker(f, footer[0], app);
    draw_footer(f, footer[1], app);
}

fn draw_casino(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = pane_block("Casino", app.focus == PaneFocus::Casino);
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)])
        .split(inner);

    let items: Vec<ListItem> = GameId::ALL
        .iter()
        .map(|game| {
            let style = if *game == GameId::Mines {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(Span::styled(game.title(), style)))
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::RIGHT))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");
    let mut state = ListState::default();
    state.select(Some(app.casino.selected));
    f.render_stateful_widget(list, columns[0], &mut state);

    let segments = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(columns[1]);
    let paragraph = Paragraph::new(build_bet_lines(app)).wrap(Wrap { trim: true });
    f.render_widget(paragraph, segments[0]);

    match &app.casino.table {
        Some(LiveTable::Crash { flight, countdown, .. }) => {
            let label = match flight.state() {
                FlightState::Flying if !countdown.is_zero() => {
                    format!("launch in {}", format_duration(*countdown))
                }
                FlightState::Flying => format!("{:.2}x  [Enter] cash out", flight.multiplier()),
                FlightState::Crashed => format!("CRASHED at {:.2}x", flight.multiplier()),
                FlightState::CashedOut(at) => format!("cashed out {:.2}x", at),
            };
            // log scale so the bar keeps moving on long flights
            let ratio = (flight.multiplier().ln() / 10f64.ln()).clamp(0.0, 1.0);
            let gauge = Gauge::default()
                .block(Block::default().title("Rocket"))
                .ratio(ratio)
                .gauge_style(
                    Style::default()
                        .fg(Color::Green)
                        .bg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                )
                .label(label);
            f.render_widget(gauge, segments[1]);
        }
        Some(table) => {
            let paragraph =
                Paragraph::new(build_table_lines(table, &app.casino)).wrap(Wrap { trim: false });
            f.render_widget(paragraph, segments[1]);
        }
        None => {
            let text = app
                .casino
                .last_result
                .clone()
                .unwrap_or_else(|| "Pick a game and press Enter to play.".to_string());
            let paragraph = Paragraph::new(text).wrap(Wrap { trim: true });
            f.render_widget(paragraph, segments[1]);
        }
    }
}

fn build_bet_lines(app: &App) -> Vec<Line<'static>> {
    let casino = &app.casino;
    let setting = match casino.game() {
        GameId::Dice => format!(
            "roll over {}  pays {:.4}x",
            casino.dice_target,
            win_multiplier(casino.dice_target)
        ),
        GameId::Baccarat => {
            let rule = match casino.baccarat.rule {
                DrawRule::TwoCard => "two-card",
                DrawRule::Tableau => "tableau",
            };
            format!("call {}  rule {}", casino.baccarat.call, rule)
        }
        GameId::Slots => format!("theme {}", SlotTheme::builtin(casino.theme).name()),
        GameId::Crash => "cash out manually".to_string(),
        GameId::Mines => "coming soon".to_string(),
        _ => String::new(),
    };
    vec![
        Line::from(vec![
            Span::styled(casino.game().title(), Style::default().fg(Color::LightCyan)),
            Span::raw("  stake "),
            Span::styled(
                format!("${:.2}", casino.stake()),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(Span::styled(setting, Style::default().fg(Color::Gray))),
    ]
}

fn build_table_lines(table: &LiveTable, casino: &CasinoState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match table {
        LiveTable::Pending { round, remaining, .. } => {
            lines.push(Line::from(Span::styled(
                format!("Resolving... {}", format_duration(*remaining)),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            )));
            if let OutcomeDetail::Slots(spin) = &round.settlement().detail {
                let theme = SlotTheme::builtin(casino.theme);
                let cells = spin.winning_cells();
                for row in 0..ROWS {
                    let spans: Vec<Span> = spin
                        .grid
                        .iter()
                        .enumerate()
                        .map(|(reel, column)| {
                            let style = if cells.contains(&(reel, row)) {
                                Style::default().fg(Color::Yellow)
                            } else {
                                Style::default()
                            };
                            Span::styled(format!(" [{}] ", theme.glyph(column[row])), style)
                        })
                        .collect();
                    lines.push(Line::from(spans));
                }
            }
        }
        LiveTable::Blackjack { table, .. } => {
            lines.push(Line::from(format!(
                "Dealer  {}  ({})",
                format_hand(table.dealer_visible()),
                table.dealer_value()
            )));
            lines.push(Line::from(format!(
                "You     {}  ({})",
                format_hand(table.player()),
                table.player_value()
            )));
            lines.push(Line::from(""));
            lines.push(Line::from("[Enter] hit  [S] stand"));
        }
        LiveTable::Scratch { round, .. } => {
            if let OutcomeDetail::Scratch(card) = &round.settlement().detail {
                for (r, symbols) in card.cells().chunks(3).enumerate() {
                    let spans: Vec<Span> = symbols
                        .iter()
                        .enumerate()
                        .map(|(c, symbol)| {
                            if card.is_revealed(r * 3 + c) {
                                Span::raw(format!(" {} ", symbol.glyph()))
                            } else {
                                Span::styled(" ▓▓ ", Style::default().fg(Color::DarkGray))
                            }
                        })
                        .collect();
                    lines.push(Line::from(spans));
                }
                let revealed = (0..CELLS).filter(|i| card.is_revealed(*i)).count();
                lines.push(Line::from(format!(
                    "{}/{} scratched  [Enter] scratch  [A] reveal all",
                    revealed, CELLS
                )));
            }
        }
        LiveTable::Crash { .. } => {}
    }
    lines
}

fn draw_market(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = pane_block("Market & Wallet", app.focus == PaneFocus::Market);
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);
    let vault = app.session.vault();
    let wallet = vault.wallet();

    let segments = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);
    let address = wallet.address.as_deref().unwrap_or("not connected");
    let header = Paragraph::new(Line::from(vec![
        Span::styled("Cash ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("${:.2}", vault.free_cash()),
            Style::default().fg(Color::LightGreen),
        ),
        Span::styled(
            if vault.held() > 0.0 {
                format!(" (+${:.2} in play)", vault.held())
            } else {
                String::new()
            },
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  |  NFTs "),
        Span::raw(wallet.nfts.len().to_string()),
        Span::raw("  |  "),
        Span::styled(address.to_string(), Style::default().fg(Color::DarkGray)),
    ]));
    f.render_widget(header, segments[0]);

    let items: Vec<ListItem> = app
        .session
        .market()
        .assets()
        .iter()
        .map(|asset| {
            let change_color = if asset.change_24h >= 0.0 {
                Color::LightGreen
            } else {
                Color::LightRed
            };
            let line = Line::from(vec![
                Span::styled(format!("{:<4}", asset.symbol), Style::default().fg(Color::White)),
                Span::styled(
                    format!(" {:>11.2}", asset.price),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(format!(" ({})", format_price_delta(asset.last_delta))),
                Span::styled(
                    format!(" {:+.2}%", asset.change_24h),
                    Style::default().fg(change_color),
                ),
                Span::raw("  hold "),
                Span::styled(
                    format!("{:.6}", wallet.quantity(&asset.symbol)),
                    Style::default().fg(Color::LightCyan),
                ),
            ]);
            ListItem::new(vec![line])
        })
        .collect();
    let list = List::new(items).highlight_style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let mut state = ListState::default();
    state.select(Some(app.market.selected));
    f.render_stateful_widget(list, segments[1], &mut state);
}

fn draw_mining(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = pane_block("Mining Rig", app.focus == PaneFocus::Mining);
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);
    let mining = app.session.vault().mining();

    let rig_rate = mining.cpu_hashrate + mining.gpu_hashrate + mining.plan_hashrate() * 1e6;
    let toggle = |on: bool| {
        if on {
            Span::styled("ON ", Style::default().fg(Color::LightGreen))
        } else {
            Span::styled("OFF", Style::default().fg(Color::DarkGray))
        }
    };
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("CPU ", Style::default().fg(Color::Gray)),
            toggle(mining.cpu_enabled),
            Span::styled("  GPU ", Style::default().fg(Color::Gray)),
            toggle(mining.gpu_enabled),
            Span::raw("  "),
            Span::styled(format_hashrate(rig_rate), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::styled("Mined ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:.8} BTC", mining.total_mined),
                Style::default().fg(Color::LightCyan),
            ),
        ]),
    ]);
    let segments = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(inner);
    f.render_widget(header, segments[0]);

    let items: Vec<ListItem> = PLANS
        .iter()
        .map(|plan| {
            let owned = mining.owned(plan.id);
            let content = Line::from(vec![
                Span::styled(
                    format!("{:>2}×", owned),
                    Style::default().fg(if owned > 0 {
                        Color::LightGreen
                    } else {
                        Color::DarkGray
                    }),
                ),
                Span::raw(" "),
                Span::styled(format!("{:<18}", plan.name), Style::default().fg(Color::White)),
                Span::raw(format!(" {:>5.2} MH/s", plan.hashrate_mh)),
                Span::styled(
                    format!("  ${:.0}", plan.cost),
                    Style::default().fg(Color::LightCyan),
                ),
            ]);
            ListItem::new(vec![content])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::NONE))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    let mut state = ListState::default();
    state.select(Some(app.mining.selected));
    f.render_stateful_widget(list, segments[1], &mut state);
}

fn draw_ledger(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = pane_block("Ledger", app.focus == PaneFocus::Ledger);
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);
    let log = app.session.vault().log();

    if log.is_empty() {
        let paragraph = Paragraph::new("No transactions yet. Trade, mine or play to fill the ledger.")
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, inner);
        return;
    }

    let visible_height = inner.height as usize;
    let items: Vec<ListItem> = log
        .iter()
        .skip(app.ledger.scroll)
        .take(visible_height)
        .map(build_ledger_item)
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::NONE));
    f.render_widget(list, inner);
}

fn build_ledger_item(tx: &Transaction) -> ListItem<'static> {
    let timestamp = local_time(tx.timestamp).format("%H:%M:%S");
    let kind_color = match tx.kind {
        TransactionKind::Buy | TransactionKind::Deposit | TransactionKind::MiningReward => {
            Color::LightGreen
        }
        TransactionKind::Sell | TransactionKind::Withdraw => Color::LightRed,
        TransactionKind::GameSettlement => Color::Magenta,
        TransactionKind::HardwarePurchase | TransactionKind::Swap => Color::LightCyan,
    };
    let mut spans = vec![
        Span::styled(timestamp.to_string(), Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(format!("{:<17}", tx.kind.to_string()), Style::default().fg(kind_color)),
        Span::styled(
            format!("{:<10}", tx.primary_asset),
            Style::default().fg(Color::White),
        ),
        Span::raw(format!(" {:.6}", tx.amount)),
        Span::raw("  ≈"),
        Span::styled(
            format!("${:.2}", tx.usd_value),
            Style::default().fg(Color::LightGreen),
        ),
    ];
    if let (Some(to), Some(amount)) = (&tx.secondary_asset, tx.secondary_amount) {
        spans.push(Span::raw(format!("  → {:.6} {}", amount, to)));
    }
    spans.push(Span::styled(
        format!("  #{}", tx.id),
        Style::default().fg(Color::DarkGray),
    ));
    ListItem::new(vec![Line::from(spans)])
}

fn draw_ticker(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .title("Ticker")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let mut spans = vec![
        Span::styled(
            format!("Portfolio ${:.2}", app.session.portfolio_value()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  |  Wins: "),
    ];
    let mut any = false;
    for win in app.session.recent_wins() {
        any = true;
        spans.push(Span::styled(
            format!("{} +${:.2}  ", win.game.slug(), win.payout),
            Style::default().fg(Color::LightGreen),
        ));
    }
    if !any {
        spans.push(Span::styled("none yet", Style::default().fg(Color::DarkGray)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).alignment(Alignment::Left);
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);
    f.render_widget(paragraph, inner);
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Ops & Feed")
        .border_style(Style::default().fg(Color::Gray));
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(inner);

    let instruction_lines = vec![
        Line::from("Tab cycle focus | Q save & quit"),
        Line::from("Casino: ↑↓ game  ←→ stake  [ ] setting  R baccarat rule  Enter play"),
        Line::from("Market: ↑↓ asset  ←→ sell/buy $100  B/M bulk  S swap  D/W cash  X wallet  O oracle"),
        Line::from("Mining: ↑↓ plan  Enter buy  C cpu  G gpu  |  Ledger: ↑↓ scroll"),
    ];
    let instruction = Paragraph::new(instruction_lines).wrap(Wrap { trim: true });
    f.render_widget(instruction, columns[0]);

    let mut message_lines: Vec<Line> = Vec::new();
    for msg in app.messages.iter() {
        message_lines.push(Line::from(Span::raw(msg.clone())));
    }
    if message_lines.is_empty() {
        message_lines.push(Line::from(Span::styled(
            "Awaiting signal...",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let feed = Paragraph::new(message_lines).wrap(Wrap { trim: true });
    f.render_widget(feed, columns[1]);
}

fn pane_block<'a>(title: &'a str, focused: bool) -> Block<'a> {
    let border_style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Block::default()
        .title(Span::styled(title, Style::default().fg(Color::White)))
        .borders(Borders::ALL)
        .border_style(border_style)
}
