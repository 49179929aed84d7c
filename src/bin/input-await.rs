use clap::Parser;
use input_await::{
    config::InputConfig,
    event::{ChatBus, ChatMessage, InputListener},
    input::WeakInputRegistry,
    ChatInputRegistry, InputError, InputResult,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::Notify,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "input-await.json")]
    config: PathBuf,

    /// Seconds each question stays open
    #[arg(short, long, default_value_t = 60)]
    timeout: u64,
}

/// A short questionnaire for one console participant.
#[derive(Clone)]
struct Questionnaire {
    registry: WeakInputRegistry<Uuid, ChatMessage>,
    participant: Uuid,
    ttl: Duration,
    done: Arc<Notify>,
}

impl Questionnaire {
    fn ask_name(&self) {
        println!("What is your name?");
        let next = self.clone();
        let done = self.done.clone();
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry
            .expect::<String>(self.participant)
            .until(self.ttl)
            .then(move |name| {
                println!("Nice to meet you, {}.", name);
                next.ask_age();
            })
            .expired(move |_| {
                println!("Too slow, the question expired.");
                done.notify_one();
            })
            .register(&registry);
    }

    fn ask_age(&self) {
        println!("How old are you?");
        let next = self.clone();
        let retry = self.clone();
        let done = self.done.clone();
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry
            .expect::<i32>(self.participant)
            .until(self.ttl)
            .then(move |age| {
                println!("{} years, noted.", age);
                next.ask_consent();
            })
            .mismatch(move |raw| {
                println!("'{}' is not a number.", raw);
                retry.ask_age();
            })
            .expired(move |_| {
                println!("Too slow, the question expired.");
                done.notify_one();
            })
            .register(&registry);
    }

    fn ask_consent(&self) {
        println!("May we remember you? (yes/no)");
        let retry = self.clone();
        let done = self.done.clone();
        let expired = self.done.clone();
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry
            .expect::<bool>(self.participant)
            .until(self.ttl)
            .then_with_context(move |consent, message: &ChatMessage| {
                let verdict = if consent { "remembered" } else { "forgotten" };
                println!("You will be {} (answered at {}).", verdict, message.sent_at);
                done.notify_one();
            })
            .mismatch(move |raw| {
                println!("'{}' is neither yes nor no.", raw);
                retry.ask_consent();
            })
            .expired(move |_| {
                println!("Too slow, the question expired.");
                expired.notify_one();
            })
            .register(&registry);
    }
}

async fn run(cli: &Cli) -> InputResult<()> {
    let config = if cli.config.exists() {
        InputConfig::from_file(&cli.config)?
    } else {
        InputConfig::default()
    };

    info!("config loaded.");
    debug!("config: {:?}", config);

    let registry = ChatInputRegistry::from_config(&config);
    let bus = ChatBus::new(config.bus_capacity);
    let listener = InputListener::new(registry.clone()).spawn(&bus);

    let participant = Uuid::new_v4();
    let done = Arc::new(Notify::new());
    let questionnaire = Questionnaire {
        registry: registry.downgrade(),
        participant,
        ttl: Duration::from_secs(cli.timeout),
        done: done.clone(),
    };
    questionnaire.ask_name();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = done.notified() => break,
            line = lines.next_line() => {
                let line = line
                    .map_err(|e| InputError::internal(format!("Failed to read stdin: {}", e)))?;
                match line {
                    Some(line) => {
                        bus.publish(ChatMessage::new(participant, line))?;
                    }
                    None => break,
                }
            }
        }
    }

    drop(bus);
    listener
        .await
        .map_err(|e| InputError::internal(format!("Input listener panicked: {}", e)))?
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
