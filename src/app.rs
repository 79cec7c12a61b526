use crate::config::{load_settings, save_settings_atomic, Cli, Paths, Settings, StorageBackend};
use crate::input::{collect_input_nonblocking, map_event_to_command, Command, Scene};
use crate::render::{draw, View};
use crate::session::PetSession;
use crate::storage::{JsonFileStore, MemoryStore, PetStore};
use crate::thoughts::{GeminiClient, Reply, ThoughtBroker, ThoughtError};
use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::{info, warn};

const CHAT_INPUT_MAX: usize = 200;

type Term = Terminal<CrosstermBackend<Stdout>>;

pub(crate) struct App {
    settings: Settings,
    session: PetSession,
    broker: ThoughtBroker,
    replies: mpsc::Receiver<Reply>,
    scene: Scene,
    chat_input: String,
    should_quit: bool,
}

fn open_store(settings: &Settings, paths: &Paths) -> Box<dyn PetStore> {
    match settings.storage {
        StorageBackend::File => Box::new(JsonFileStore::new(&paths.pets_dir)),
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    }
}

fn build_client(settings: &Settings) -> Option<GeminiClient> {
    if !settings.gemini.enabled {
        info!("text model disabled, using built-in lines");
        return None;
    }
    match GeminiClient::from_settings(&settings.gemini) {
        Ok(client) => {
            info!(model = %settings.gemini.model, "text model enabled");
            Some(client)
        }
        Err(ThoughtError::MissingKey) => {
            info!(vars = ?settings.gemini.api_key_env, "no API key set, using built-in lines");
            None
        }
        Err(err) => {
            warn!(error = %err, "text model unavailable, using built-in lines");
            None
        }
    }
}

impl App {
    fn init(cli: &Cli, paths: &Paths) -> Self {
        let mut settings = load_settings(&paths.settings_path);
        if !paths.settings_path.exists() {
            if let Err(err) = save_settings_atomic(&paths.settings_path, &settings) {
                warn!(error = %err, "could not write default settings");
            }
        }
        settings.apply_cli(cli);

        let owner = settings.owner_id();
        let store = open_store(&settings, paths);
        info!(owner = %owner, store = %store.describe(), "opening pet");

        let (mut broker, replies) = ThoughtBroker::new(
            build_client(&settings),
            Duration::from_millis(settings.gemini.timeout_ms),
        );
        let (mut session, greeting) = PetSession::open(
            owner,
            store,
            settings.rules.clone(),
            settings.seed,
            Utc::now(),
        );
        if let Some(req) = greeting {
            let ticket = broker.request_thought(req);
            session.expect_thought(ticket);
        }
        let scene = if session.recap().is_some() {
            Scene::Recap
        } else {
            Scene::Main
        };

        Self {
            settings,
            session,
            broker,
            replies,
            scene,
            chat_input: String::new(),
            should_quit: false,
        }
    }

    fn run(&mut self, term: &mut Term) -> Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.settings.fps_cap as f32);
        let tick_every = Duration::from_millis(self.settings.tick_ms);
        let mut last_tick = Instant::now();

        while !self.should_quit {
            while let Ok(reply) = self.replies.try_recv() {
                self.accept(reply, Utc::now());
            }

            if last_tick.elapsed() >= tick_every {
                last_tick = Instant::now();
                if self.session.tick(Utc::now()) && self.scene == Scene::Chat {
                    self.scene = Scene::Main;
                }
            }

            let now = Utc::now();
            term.draw(|f| {
                draw(
                    f,
                    &View {
                        session: &self.session,
                        scene: self.scene,
                        chat_input: &self.chat_input,
                        online: self.broker.is_online(),
                        mono: !self.settings.enable_color,
                        now,
                    },
                )
            })?;

            for ev in collect_input_nonblocking(frame_dt)? {
                let dead = self.session.snapshot().is_dead;
                if let Some(cmd) = map_event_to_command(self.scene, dead, &ev) {
                    self.handle(cmd, Utc::now());
                }
                if self.should_quit {
                    break;
                }
            }
        }

        self.session.tick(Utc::now());
        Ok(())
    }

    fn accept(&mut self, reply: Reply, now: DateTime<Utc>) {
        match reply {
            Reply::Thought { ticket, text } => {
                self.session.accept_thought(ticket, text, now);
            }
            Reply::Chat { ticket, text } => {
                self.session.accept_chat_reply(ticket, text);
            }
        }
    }

    fn handle(&mut self, cmd: Command, now: DateTime<Utc>) {
        match cmd {
            Command::Quit => self.should_quit = true,
            Command::Act(action) => {
                let report = self.session.act(action, now);
                if let Some(req) = report.follow_up {
                    let ticket = self.broker.request_thought(req);
                    self.session.expect_thought(ticket);
                }
            }
            Command::Revive => self.session.revive(now),
            Command::OpenChat => self.scene = Scene::Chat,
            Command::ChatChar(ch) => {
                if self.chat_input.chars().count() < CHAT_INPUT_MAX {
                    self.chat_input.push(ch);
                }
            }
            Command::ChatBackspace => {
                self.chat_input.pop();
            }
            Command::ChatSend => {
                let text = std::mem::take(&mut self.chat_input);
                if let Some(req) = self.session.send_chat(&text, now) {
                    let ticket = self.broker.request_chat(req);
                    self.session.expect_chat(ticket);
                }
                if self.session.snapshot().is_dead {
                    self.scene = Scene::Main;
                }
            }
            Command::HelpToggle => {
                self.scene = if self.scene == Scene::Help {
                    Scene::Main
                } else {
                    Scene::Help
                };
            }
            Command::DismissRecap => {
                self.session.dismiss_recap();
                self.scene = Scene::Main;
            }
            Command::Back => self.scene = Scene::Main,
        }
    }
}

fn setup_terminal() -> Result<Term> {
    terminal::enable_raw_mode()?;
    let mut out = io::stdout();
    execute!(out, EnterAlternateScreen, cursor::Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(term: &mut Term) -> Result<()> {
    execute!(io::stdout(), cursor::Show, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    term.show_cursor()?;
    Ok(())
}

/// Must be called from inside a tokio runtime; thought requests are spawned on it.
pub(crate) fn run(cli: &Cli, paths: &Paths) -> Result<()> {
    let mut app = App::init(cli, paths);
    let mut term = setup_terminal()?;
    let result = app.run(&mut term);
    restore_terminal(&mut term)?;
    info!(owner = %app.session.owner(), "bye");
    result
}
