use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use screenflow::analytics::{AnalyticsSink, HttpAnalyticsSink, LogSink, spawn_analytics_queue};
use screenflow::assist::{AssistEditor, HttpGenerationEndpoint};
use screenflow::config::{RuntimeConfig, SourceLocation};
use screenflow::element::referenced_variables;
use screenflow::flow::{FlowSession, SessionEvent};
use screenflow::source::{CachedScreenSource, FileScreenSource, HttpScreenSource, ScreenSource};

const HELP: &str = "Commands: show | tap <id> | input <id> <text> | next | back | skip | skip-all \
| goto <screen> | vars | assist <prompt> | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RuntimeConfig::from_env().context("invalid SCREENFLOW_* configuration")?;

    let source: Box<dyn ScreenSource> = match config.source.clone() {
        Some(SourceLocation::Url(url)) => Box::new(CachedScreenSource::new(
            HttpScreenSource::new(url),
            config.cache_path.clone(),
        )),
        Some(SourceLocation::File(path)) => Box::new(CachedScreenSource::new(
            FileScreenSource::new(path),
            config.cache_path.clone(),
        )),
        None => {
            eprintln!("Error: no screen source configured");
            eprintln!("  export SCREENFLOW_SOURCE_URL=https://... or SCREENFLOW_SOURCE_FILE=./flow.json");
            std::process::exit(1);
        }
    };

    let sink: Arc<dyn AnalyticsSink> = match &config.analytics.url {
        Some(url) => Arc::new(HttpAnalyticsSink::new(url.clone())),
        None => Arc::new(LogSink),
    };
    let (analytics, analytics_task) = spawn_analytics_queue(sink, &config.analytics);

    eprintln!("screenflow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   User: {}", config.user_id);
    if let Some(assist) = &config.assist {
        eprintln!("   Assist: {}", assist.url);
    }
    eprintln!("   {HELP}\n");

    let mut session = FlowSession::new(config.user_id.clone()).with_analytics(analytics.clone());
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::ScreenViewed { screen_id, index } => {
                    eprintln!("-- screen {index}: {screen_id}")
                }
                SessionEvent::Completed { payload } => {
                    eprintln!("-- completed");
                    if let Ok(json) = serde_json::to_string_pretty(&payload) {
                        println!("{json}");
                    }
                }
                SessionEvent::Abandoned { screen_id } => {
                    eprintln!("-- abandoned at {}", screen_id.unwrap_or_default())
                }
                SessionEvent::Started { screen_count, .. } => {
                    eprintln!("-- started with {screen_count} screens")
                }
            }
        }
    });

    session.load(source.as_ref()).await?;
    print_screen(&session);

    let endpoint = config
        .assist
        .as_ref()
        .map(|assist| Arc::new(HttpGenerationEndpoint::from_config(assist)));
    let mut editors: HashMap<String, AssistEditor> = HashMap::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let result = match command {
            "" => Ok(()),
            "show" => {
                print_screen(&session);
                Ok(())
            }
            "tap" => session.dispatch(rest.trim()).map(|_| ()),
            "input" => {
                let (id, text) = rest.split_once(' ').unwrap_or((rest, ""));
                session.set_input(id, text)
            }
            "next" => {
                session.next();
                Ok(())
            }
            "back" => {
                session.back();
                Ok(())
            }
            "skip" => {
                session.skip_screen();
                Ok(())
            }
            "skip-all" => {
                session.skip_all();
                Ok(())
            }
            "goto" => {
                session.navigate_to(rest.trim());
                Ok(())
            }
            "vars" => {
                if let Ok(json) = serde_json::to_string_pretty(&session.effective_variables()) {
                    println!("{json}");
                }
                Ok(())
            }
            "assist" => {
                let (Some(endpoint), Some(screen)) = (&endpoint, session.current_screen()) else {
                    eprintln!("assist is not configured or no screen is active");
                    eprint!("> ");
                    continue;
                };
                let editor = editors.entry(screen.id.clone()).or_insert_with(|| {
                    AssistEditor::new(endpoint.clone(), screen.roots().to_vec())
                        .with_variables(referenced_variables(screen.roots()).into_iter().collect())
                });
                match editor.send(rest, |kind| eprintln!("   ({kind}...)")).await {
                    Ok(response) => {
                        println!("{}", response.message());
                        if let Ok(json) = serde_json::to_string_pretty(editor.tree()) {
                            println!("{json}");
                        }
                    }
                    Err(e) => eprintln!("assist failed: {e}"),
                }
                Ok(())
            }
            "quit" | "exit" => break,
            _ => {
                eprintln!("{HELP}");
                Ok(())
            }
        };

        if let Err(e) = result {
            eprintln!("error: {e}");
        } else if matches!(command, "tap" | "next" | "back" | "skip" | "goto") {
            print_screen(&session);
        }
        if session.state().is_terminal() {
            break;
        }
        eprint!("> ");
    }

    if let Err(e) = analytics.flush().await {
        tracing::warn!(error = %e, "Final analytics flush failed");
    }
    drop(session);
    drop(analytics);
    let _ = analytics_task.await;
    Ok(())
}

fn print_screen(session: &FlowSession) {
    match session.render() {
        Some(rendered) => match serde_json::to_string_pretty(&rendered) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("could not render screen: {e}"),
        },
        None => eprintln!("-- flow is {}", session.state()),
    }
}
