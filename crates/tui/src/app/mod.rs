mod session;

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};

use crate::{
    client::{Backend, Client},
    config::AppConfig,
    error::{AppError, Result},
    ui::{
        self,
        keymap::{self, AppAction},
    },
};

pub use session::{AppState, Focus, Session, ToastState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Quit,
}

pub struct App {
    session: Session<Client>,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::new(
            &config.base_url,
            &config.api_prefix,
            config.request_timeout(),
        )?;
        let session = Session::start(client, &config)?;
        Ok(Self {
            session,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(100);
        self.session.mount();

        while !self.should_quit {
            self.session.drain();
            self.session.expire_toast(Instant::now());

            terminal
                .draw(|frame| ui::render(frame, &self.session.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        let action = keymap::map_key(key);
                        if handle_action(&mut self.session, action) == Control::Quit {
                            self.should_quit = true;
                        }
                    }
                    _ => {}
                }
            }
            tokio::task::yield_now().await;
        }

        Ok(())
    }
}

fn handle_action<B: Backend>(session: &mut Session<B>, action: AppAction) -> Control {
    let focus = session.state.focus;
    match action {
        AppAction::Quit => return Control::Quit,
        AppAction::NextField => session.state.focus = focus.next(),
        AppAction::PrevField => session.state.focus = focus.prev(),
        AppAction::Export => session.export(),
        AppAction::Refresh => session.refresh(),
        AppAction::Submit => {
            if focus.is_form() {
                session.submit_form();
            }
        }
        AppAction::Left | AppAction::Right => cycle_choice(session, action == AppAction::Right),
        AppAction::Up => {
            if focus == Focus::Table {
                session.select_prev();
            }
        }
        AppAction::Down => {
            if focus == Focus::Table {
                session.select_next();
            }
        }
        AppAction::Delete => {
            if focus == Focus::Table {
                session.delete_selected();
            }
        }
        AppAction::Backspace => match focus {
            Focus::FormAmount => {
                session.state.form.amount.pop();
                session.state.form.error = None;
            }
            Focus::FormDescription => {
                session.state.form.description.pop();
                session.state.form.error = None;
            }
            Focus::FilterDate => session.pop_filter_date(),
            _ => {}
        },
        AppAction::Cancel => match focus {
            Focus::FilterDate => session.clear_filter_date(),
            Focus::FilterKind => session.set_type_filter(Default::default()),
            _ => session.state.form.error = None,
        },
        AppAction::Input(ch) => return handle_input(session, ch),
        AppAction::None => {}
    }
    Control::Continue
}

fn handle_input<B: Backend>(session: &mut Session<B>, ch: char) -> Control {
    match session.state.focus {
        Focus::FormAmount => {
            session.state.form.amount.push(ch);
            session.state.form.error = None;
        }
        Focus::FormDescription => {
            session.state.form.description.push(ch);
            session.state.form.error = None;
        }
        Focus::FilterDate => session.push_filter_date(ch),
        Focus::FormKind | Focus::FilterKind => {
            if ch == ' ' {
                cycle_choice(session, true);
            }
        }
        Focus::Table => match ch {
            'q' | 'Q' => return Control::Quit,
            'd' | 'D' => session.delete_selected(),
            'j' => session.select_next(),
            'k' => session.select_prev(),
            _ => {}
        },
    }
    Control::Continue
}

fn cycle_choice<B: Backend>(session: &mut Session<B>, forward: bool) {
    match session.state.focus {
        Focus::FormKind => {
            session.state.form.kind = session.state.form.kind.toggle();
        }
        Focus::FilterKind => {
            let current = session.state.store.filter().kind;
            let next = if forward {
                current.next()
            } else {
                current.prev()
            };
            session.set_type_filter(next);
        }
        _ => {}
    }
}
