use crate::chat::ChatSessionFactory;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::launch;
use anyhow::Result;
use clap::Parser;
use std::io::{BufRead, Write};

mod chat;
mod cli;
mod config;
mod llm;
mod pipeline;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let query = args.query.clone();
    let enter_chat = args.chat;
    let config = args.into_config();

    let context = PipelineContext::new(config)?;
    let run = launch(&query, &context).await?;

    println!("\n{}\n", run.report.text);

    if enter_chat {
        run_chat_loop(&context, &run.report.text).await?;
    }

    Ok(())
}

/// 报告追问会话循环，空行退出
async fn run_chat_loop(context: &PipelineContext, report_text: &str) -> Result<()> {
    let factory = ChatSessionFactory::new(context.gateway.clone(), context.config.llm.clone());
    let mut session = factory.create_session(report_text);

    println!("💬 进入报告追问会话（输入空行退出）");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        let message = line.trim();
        if message.is_empty() {
            break;
        }

        match session.send(message).await {
            Ok(answer) => println!("{}\n", answer),
            Err(error) => eprintln!("❌ 追问失败: {}", error),
        }
    }

    Ok(())
}
