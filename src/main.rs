use anyhow::Context;
use clap::Parser;
use genai_studio::{cli, commands, config, controller, gemini, studio};
use cli::{Cli, Commands};
use config::Config;
use controller::Controller;
use gemini::GeminiClient;
use genai_studio_common::{Action, ImageSlot, ImageStyle, Mode};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = Config::from_env().context("設定の読み込みに失敗しました")?;
    let client = GeminiClient::new(&config).context("APIクライアントの初期化に失敗しました")?;
    let mut controller = Controller::new(client, Duration::from_millis(config.download_delay_ms));

    match cli.command {
        Commands::Story { prompts, prompts_file, characters, style, ratio, run } => {
            println!("📖 genai-studio - ストーリー生成\n");

            let prompts = match (prompts, prompts_file) {
                (Some(prompts), _) => prompts,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("プロンプトファイルを読み込めません: {}", path.display()))?,
                (None, None) => String::new(),
            };

            commands::load_characters(&mut controller, &characters)?;
            controller.dispatch(Action::SetPrompts(prompts));
            controller.dispatch(Action::SetStyle(style.0));
            controller.dispatch(Action::SetNumberOfImages(run.count));
            commands::apply_ratio(&mut controller, Mode::Story, &ratio);

            execute(&mut controller, Mode::Story, &run.output, run.dry_run, cli.verbose).await?;
        }

        Commands::Swap { base, item, prompt, ratio, run } => {
            println!("👕 genai-studio - アイテム差し替え\n");

            commands::load_slot(&mut controller, ImageSlot::SwapBase, &base)?;
            commands::load_slot(&mut controller, ImageSlot::SwapItem, &item)?;
            controller.dispatch(Action::SetSwapInstruction(prompt));
            controller.dispatch(Action::SetNumberOfImages(run.count));
            commands::apply_ratio(&mut controller, Mode::ItemSwap, &ratio);

            execute(&mut controller, Mode::ItemSwap, &run.output, run.dry_run, cli.verbose).await?;
        }

        Commands::FaceSwap { target, face, ratio, run } => {
            println!("🙂 genai-studio - 顔差し替え\n");

            commands::load_slot(&mut controller, ImageSlot::FaceTarget, &target)?;
            commands::load_slot(&mut controller, ImageSlot::FaceSource, &face)?;
            controller.dispatch(Action::SetNumberOfImages(run.count));
            commands::apply_ratio(&mut controller, Mode::FaceSwap, &ratio);

            execute(&mut controller, Mode::FaceSwap, &run.output, run.dry_run, cli.verbose).await?;
        }

        Commands::RemoveBg { image, output, dry_run } => {
            println!("✂ genai-studio - 背景除去\n");

            commands::load_slot(&mut controller, ImageSlot::BackgroundInput, &image)?;

            execute(&mut controller, Mode::BackgroundRemoval, &output, dry_run, cli.verbose).await?;
        }

        Commands::Studio { output } => {
            studio::run_studio(controller, &output).await?;
        }

        Commands::Styles => {
            println!("🎨 スタイル一覧\n");
            for style in ImageStyle::ALL {
                println!("  {}", style.name());
            }
        }
    }

    Ok(())
}

async fn execute(
    controller: &mut Controller<GeminiClient>,
    mode: Mode,
    output: &std::path::Path,
    dry_run: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    if dry_run {
        commands::print_dry_run(controller, mode, verbose);
        return Ok(());
    }

    std::fs::create_dir_all(output)
        .with_context(|| format!("出力ディレクトリを作成できません: {}", output.display()))?;

    let saved = commands::run_and_save(controller, mode, output).await?;
    println!("\n✅ 完了（{}件保存）", saved.len());
    Ok(())
}
