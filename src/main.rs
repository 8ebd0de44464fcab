use std::path::Path;

use color_eyre::{eyre::WrapErr, Result};
use plumb::{CommandNode, Direction, Engine, EngineConfig};
use tracing_subscriber::prelude::*;

#[macro_use]
extern crate tracing;

fn simple(argv: &[&str]) -> CommandNode {
    CommandNode::simple(argv.iter().copied())
}

/// The trees the engine is demonstrated on, with their shell spelling.
fn fixtures(scratch: &Path) -> Vec<CommandNode> {
    let file = scratch.join("file");
    let echo_123 = || simple(&["echo", "1", "2", "3"]);

    vec![
        // uname
        CommandNode::pipeline([simple(&["uname"])]),
        // echo 1 2 3 > file && wc < file &
        CommandNode::plain()
            .background(
                CommandNode::conditional(echo_123().redirect(Direction::Output, &file))
                    .and(simple(&["wc"]).redirect(Direction::Input, &file))
                    .build(),
            )
            .build(),
        // echo 1 2 3 | wc
        CommandNode::pipeline([echo_123(), simple(&["wc"])]),
        // echo 1 >> file || echo 2 >> file && cat file
        CommandNode::conditional(simple(&["echo", "1"]).redirect(Direction::Append, &file))
            .or(simple(&["echo", "2"]).redirect(Direction::Append, &file))
            .and(CommandNode::simple(["cat".to_string(), file.display().to_string()]))
            .build(),
        // echo 1 2 3 | wc > file ; cat file
        CommandNode::plain()
            .then(CommandNode::pipeline([
                echo_123(),
                simple(&["wc"]).redirect(Direction::Output, &file),
            ]))
            .then(CommandNode::simple(["cat".to_string(), file.display().to_string()]))
            .build(),
        // echo 1 || (echo 2 && echo 3)
        CommandNode::conditional(simple(&["echo", "1"]))
            .or(CommandNode::conditional(simple(&["echo", "2"]))
                .and(simple(&["echo", "3"]))
                .build())
            .build(),
        // yes | head
        CommandNode::pipeline([simple(&["yes"]), simple(&["head"])]),
    ]
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let (writer, _guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(".", "logs"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_error::ErrorLayer::default())
        .init();

    color_eyre::install()?;

    let config = match std::env::var_os("PLUMB_CONFIG") {
        Some(path) => EngineConfig::load(&path)
            .wrap_err_with(|| format!("loading {}", Path::new(&path).display()))?,
        None => EngineConfig::default(),
    };
    trace!(?config, "engine config");

    let engine = Engine::new(config);

    let scratch = std::env::temp_dir().join(format!("plumb-demo-{}", std::process::id()));
    std::fs::create_dir_all(&scratch)?;

    for tree in fixtures(&scratch) {
        println!("$ {tree}");

        let status = engine.run(&tree).await?;
        // keep background output from bleeding into the next fixture
        engine.reaper().settle().await;

        match status.code() {
            Some(code) => println!("[exit {code}, success: {}]", status.success()),
            None => println!("[killed by signal]"),
        }
    }

    std::fs::remove_dir_all(&scratch)?;

    Ok(())
}
