//! Counsellor - 交互式留学顾问会话
//!
//! 用法：`counsellor [--config <path>] <email> [full name]`
//! 按邮箱恢复或注册用户，然后逐行对话；以 `/` 开头的输入为命令（/help 查看）。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use counsellor::config::load_config;
use counsellor::core::CounsellorError;
use counsellor::directory::HipolabsDirectory;
use counsellor::llm::create_llm_from_config;
use counsellor::models::{TodoUpdate, User};
use counsellor::services;
use counsellor::store::{create_store, CounsellorStore};
use counsellor::Counsellor;

const HELP: &str = "\
Commands:
  /dashboard          profile summary, strengths, stage and todos
  /complete           mark onboarding complete
  /shortlist          list shortlisted universities
  /lock <id>          lock a shortlisted university
  /unlock <id>        unlock a shortlisted university
  /todos              list todos
  /done <todo-id>     mark a todo as completed
  /applications       documents and timeline for locked universities
  /search <country>   search the university directory
  /recommend          dream / target / safe recommendations
  /history            show the conversation so far
  /quit               exit
Anything else is sent to the counsellor.";

struct Args {
    config: Option<PathBuf>,
    email: String,
    full_name: String,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut config = None;
    let mut rest = Vec::new();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        if arg == "--config" {
            config = Some(PathBuf::from(it.next().context("--config needs a path")?));
        } else {
            rest.push(arg);
        }
    }
    let Some(email) = rest.first().cloned() else {
        bail!("usage: counsellor [--config <path>] <email> [full name]");
    };
    Ok(Args {
        config,
        full_name: rest[1..].join(" "),
        email,
    })
}

async fn resume_or_signup(store: &dyn CounsellorStore, args: &Args) -> anyhow::Result<User> {
    match services::find_by_email(store, &args.email).await {
        Ok(user) => Ok(user),
        Err(CounsellorError::NotFound(_)) => {
            let (user, _) = services::signup(store, &args.email, &args.full_name)
                .await
                .context("Signup failed")?;
            println!("Welcome, {}! Your account has been created.", user.email);
            Ok(user)
        }
        Err(e) => Err(e).context("User lookup failed"),
    }
}

/// 执行一条命令；返回 false 表示退出
async fn run_command(
    line: &str,
    user: &User,
    store: &dyn CounsellorStore,
    directory: &HipolabsDirectory,
    max_records: usize,
) -> anyhow::Result<bool> {
    let (cmd, arg) = match line.split_once(' ') {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };
    let uid = user.id.as_str();

    match cmd {
        "/quit" | "/exit" => return Ok(false),
        "/help" => println!("{HELP}"),
        "/dashboard" => {
            let dash = services::load_dashboard(store, uid).await?;
            println!("{}", serde_json::to_string_pretty(&dash)?);
        }
        "/complete" => {
            services::complete_onboarding(store, uid).await?;
            println!("Onboarding marked complete.");
        }
        "/shortlist" => {
            let entries = services::list_shortlist(store, uid).await?;
            if entries.is_empty() {
                println!("No universities shortlisted yet.");
            }
            for e in entries {
                let lock = if e.locked { "[locked]" } else { "" };
                println!(
                    "{} {} ({}) {} {}",
                    e.id,
                    e.name,
                    e.country,
                    e.category.as_deref().unwrap_or("-"),
                    lock
                );
            }
        }
        "/lock" | "/unlock" if !arg.is_empty() => {
            let outcome = services::set_lock(store, uid, arg, cmd == "/lock").await?;
            println!(
                "locked={} checklist_created={}",
                outcome.locked, outcome.checklist_created
            );
        }
        "/todos" => {
            for t in services::list_todos(store, uid).await? {
                let mark = if t.completed { "x" } else { " " };
                println!("[{mark}] {} {}", t.id, t.title);
            }
        }
        "/done" if !arg.is_empty() => {
            let todo = services::update_todo(
                store,
                uid,
                arg,
                TodoUpdate {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await?;
            println!("Completed: {}", todo.title);
        }
        "/applications" => {
            let guidance = services::application_guidance(store, uid).await?;
            println!("{}", serde_json::to_string_pretty(&guidance)?);
        }
        "/search" if !arg.is_empty() => {
            let found = services::search_universities(directory, Some(arg), None, max_records).await;
            println!("{} universities found", found.len());
            for u in found {
                println!(
                    "- {} ({}) tuition {} acceptance {}",
                    u.name, u.country, u.cost_level, u.acceptance_chance
                );
            }
        }
        "/recommend" => {
            let recs = services::recommend(store, directory, uid, max_records).await?;
            if recs.is_empty() {
                println!("No recommendations available right now.");
            }
            for (category, u) in recs.iter() {
                println!("[{category}] {} ({}) {}", u.name, u.country, u.acceptance_chance);
            }
        }
        "/history" => {
            for m in store.list_messages(uid).await? {
                println!("{}: {}", m.role.as_str(), m.content);
            }
        }
        _ => println!("Unknown command or missing argument. Type /help."),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    counsellor::observability::init();

    let args = parse_args()?;
    let cfg = load_config(args.config.clone()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        Default::default()
    });

    let store: Arc<dyn CounsellorStore> = create_store(cfg.database.sqlite_path()).await;
    let llm = create_llm_from_config(&cfg);
    let directory = HipolabsDirectory::from_config(&cfg.directory);
    let counsellor = Counsellor::from_config(&cfg, store.clone(), llm);

    let user = resume_or_signup(store.as_ref(), &args).await?;
    println!("Signed in as {}. Type /help for commands.", user.email);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            match run_command(line, &user, store.as_ref(), &directory, cfg.directory.max_records).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => println!("Error: {e:#}"),
            }
            continue;
        }

        match counsellor.chat(&user.id, line).await {
            Ok(outcome) => {
                println!("{}", outcome.reply);
                for action in &outcome.executed {
                    println!("  * {}", serde_json::to_string(action)?);
                }
                println!("  (stage {} – {})", outcome.stage.ordinal(), outcome.stage.label());
            }
            Err(e) => println!("Error: {e}"),
        }
    }

    Ok(())
}
