use clap::{Args, Parser, Subcommand};
use genai_studio_common::{AspectRatio, ImageStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "genai-studio")]
#[command(about = "ストーリー画像生成・アイテム/顔差し替え・背景除去スタジオ", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// キャラクター参照画像からシーン画像を生成
    Story {
        /// シーンプロンプト（改行・カンマ区切りで複数）
        #[arg(short, long, required_unless_present = "prompts_file")]
        prompts: Option<String>,

        /// プロンプトを読み込むテキストファイル
        #[arg(long, conflicts_with = "prompts")]
        prompts_file: Option<PathBuf>,

        /// キャラクター参照画像（[名前=]パス、最大4件）
        #[arg(short, long = "character", value_name = "[NAME=]PATH", num_args = 1)]
        characters: Vec<CharacterArg>,

        /// スタイル（`styles` で一覧）
        #[arg(short, long, default_value = "Default")]
        style: StyleArg,

        #[command(flatten)]
        ratio: RatioArgs,

        #[command(flatten)]
        run: RunArgs,
    },

    /// 人物画像にアイテム画像を着せる
    Swap {
        /// 人物画像
        #[arg(long, required = true)]
        base: PathBuf,

        /// アイテム/衣服画像
        #[arg(long, required = true)]
        item: PathBuf,

        /// 指示
        #[arg(short, long, default_value = "Put the item on the person")]
        prompt: String,

        #[command(flatten)]
        ratio: RatioArgs,

        #[command(flatten)]
        run: RunArgs,
    },

    /// ターゲット画像の顔を差し替える
    FaceSwap {
        /// 体・シーン画像
        #[arg(long, required = true)]
        target: PathBuf,

        /// 使う顔の画像
        #[arg(long, required = true)]
        face: PathBuf,

        #[command(flatten)]
        ratio: RatioArgs,

        #[command(flatten)]
        run: RunArgs,
    },

    /// 背景を白に置き換える（生成は常に1枚）
    RemoveBg {
        /// 処理する画像
        #[arg(long, required = true)]
        image: PathBuf,

        /// 出力ディレクトリ
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// APIを呼ばずにリクエスト内容を表示
        #[arg(long)]
        dry_run: bool,
    },

    /// 対話セッション
    Studio {
        /// 保存先ディレクトリ
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// スタイル一覧を表示
    Styles,
}

/// アスペクト比指定
#[derive(Args, Clone, Debug)]
pub struct RatioArgs {
    /// アスペクト比 (1:1/16:9/9:16/4:3/Custom)
    #[arg(short, long, default_value = "1:1")]
    pub ratio: AspectRatio,

    /// Custom時の幅（数値以外は1）
    #[arg(long, default_value = "1")]
    pub width: String,

    /// Custom時の高さ（数値以外は1）
    #[arg(long, default_value = "1")]
    pub height: String,
}

/// 生成の共通オプション
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// 生成枚数 (1-4)
    #[arg(short = 'n', long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=4))]
    pub count: u32,

    /// 出力ディレクトリ
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// APIを呼ばずにリクエスト内容を表示
    #[arg(long)]
    pub dry_run: bool,
}

/// `[名前=]パス` 形式のキャラクター指定
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterArg {
    pub name: Option<String>,
    pub path: PathBuf,
}

impl std::str::FromStr for CharacterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = match s.split_once('=') {
            Some((name, path)) if !name.trim().is_empty() => (Some(name.trim().to_string()), path),
            Some((_, path)) => (None, path),
            None => (None, s),
        };

        if path.trim().is_empty() {
            return Err(format!("画像パスが空です: {}", s));
        }

        Ok(CharacterArg {
            name,
            path: PathBuf::from(path.trim()),
        })
    }
}

/// スタイル名（完全一致しない場合はエラーにする）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleArg(pub ImageStyle);

impl std::str::FromStr for StyleArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let style = ImageStyle::from_name(s);
        if style.name().eq_ignore_ascii_case(s.trim()) {
            Ok(StyleArg(style))
        } else {
            Err(format!("Unknown style: {}. `genai-studio styles` で一覧を表示", s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_arg_with_name() {
        let arg: CharacterArg = "Mia=refs/mia.png".parse().unwrap();
        assert_eq!(arg.name.as_deref(), Some("Mia"));
        assert_eq!(arg.path, PathBuf::from("refs/mia.png"));
    }

    #[test]
    fn test_character_arg_path_only() {
        let arg: CharacterArg = "refs/rex.jpg".parse().unwrap();
        assert!(arg.name.is_none());
        assert!("Mia=".parse::<CharacterArg>().is_err());
    }

    #[test]
    fn test_style_arg() {
        assert_eq!("glitch art".parse::<StyleArg>().unwrap(), StyleArg(ImageStyle::GlitchArt));
        assert!("Vaporwave".parse::<StyleArg>().is_err());
    }

    #[test]
    fn test_cli_parse_story() {
        let cli = Cli::try_parse_from([
            "genai-studio", "story", "-p", "cat jumping\ndog running",
            "-c", "Mia=mia.png", "-n", "2", "--ratio", "Custom", "--width", "21", "--height", "9",
        ])
        .unwrap();
        match cli.command {
            Commands::Story { prompts, characters, ratio, run, .. } => {
                assert_eq!(prompts.as_deref(), Some("cat jumping\ndog running"));
                assert_eq!(characters.len(), 1);
                assert_eq!(ratio.ratio, AspectRatio::Custom);
                assert_eq!(run.count, 2);
            }
            _ => panic!("storyのはず"),
        }
    }

    #[test]
    fn test_cli_rejects_count_out_of_range() {
        let result = Cli::try_parse_from(["genai-studio", "face-swap", "--target", "a", "--face", "b", "-n", "5"]);
        assert!(result.is_err());
    }
}
