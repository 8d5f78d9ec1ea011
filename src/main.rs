use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use env_logger::Env;
use std::env;
use std::sync::Arc;

use playsave_sync::{
    AppConfig, HttpAuthGateway, HttpSaveRemote, LocalStore, SignInMode, SyncController,
};

fn sign_in_mode(arg: Option<&str>) -> Result<SignInMode> {
    match arg.unwrap_or("prompt_once") {
        "prompt_once" => Ok(SignInMode::PromptOnce),
        "prompt_always" => Ok(SignInMode::PromptAlways),
        "no_prompt" => Ok(SignInMode::NoPrompt),
        other => bail!("未知的登录模式: {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 加载.env文件
    dotenv().ok();

    // 初始化日志
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Arc::new(AppConfig::from_env().context("读取配置失败")?);
    log::info!(
        "存档槽 {}，本地文件 {}",
        config.save_slot_name,
        config.local_save_path.display()
    );

    let store = Arc::new(
        LocalStore::open(config.local_save_path.clone(), config.storage_format)
            .context("打开本地存档失败")?,
    );
    let auth = HttpAuthGateway::new(config.clone());
    let remote = HttpSaveRemote::new(config.clone());
    let controller = SyncController::new(auth, remote, store, config);

    let mut events = controller.subscribe();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("show");

    match command {
        "signin" => {
            let mode = sign_in_mode(args.get(1).map(String::as_str))?;
            match controller.sign_in(mode).await {
                Ok(session) => println!("Hello {}, your ID is {}", session.nickname, session.object_id),
                Err(e) => log::error!("登录失败: {e}"),
            }
        }
        "save" => {
            controller.sign_in(SignInMode::PromptOnce).await?;
            match controller.save().await {
                Ok(meta) => println!("{}", meta.description),
                Err(e) => log::error!("保存失败: {e}"),
            }
        }
        "load" => {
            controller.sign_in(SignInMode::PromptOnce).await?;
            match controller.load().await {
                Ok(Some(data)) => println!(
                    "已从云端加载 {} 个整数键",
                    data.int_data.len()
                ),
                Ok(None) => println!("云端没有存档"),
                Err(e) => log::error!("加载失败: {e}"),
            }
        }
        "show" => {
            let data = controller.store().snapshot();
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        other => bail!("未知命令: {other} (可用: signin/save/load/show)"),
    }

    while let Ok(event) = events.try_recv() {
        log::info!("事件: {event:?}");
    }

    Ok(())
}
