//! Article Factory - 命令行入口
//!
//! 初始化日志、加载配置、构建文章工厂，执行一次工作流并把结果 JSON 打印到 stdout。

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use article_factory::config::load_config;
use article_factory::core::{
    create_llm_from_config, factory_from_config, ArticleRequest, QualityLevel, TopicSource,
    Urgency,
};
use article_factory::observability;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Manual,
    HotTopic,
    SeoKeyword,
    Calendar,
}

impl From<SourceArg> for TopicSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Manual => TopicSource::Manual,
            SourceArg::HotTopic => TopicSource::HotTopic,
            SourceArg::SeoKeyword => TopicSource::SeoKeyword,
            SourceArg::Calendar => TopicSource::Calendar,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UrgencyArg {
    Normal,
    High,
    Emergency,
}

impl From<UrgencyArg> for Urgency {
    fn from(arg: UrgencyArg) -> Self {
        match arg {
            UrgencyArg::Normal => Urgency::Normal,
            UrgencyArg::High => Urgency::High,
            UrgencyArg::Emergency => Urgency::Emergency,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QualityArg {
    Standard,
    High,
}

impl From<QualityArg> for QualityLevel {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Standard => QualityLevel::Standard,
            QualityArg::High => QualityLevel::High,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "article-factory")]
#[command(about = "Multi-agent pipeline that turns a health topic into a publish-ready article")]
#[command(version)]
struct Args {
    /// Topic to write about (e.g., "立春养肝")
    #[arg(short, long)]
    topic: String,

    /// Where the topic came from
    #[arg(long, value_enum, default_value = "manual")]
    source: SourceArg,

    /// Target audience description
    #[arg(short, long)]
    audience: Option<String>,

    /// Urgency; emergency runs the single-pass workflow
    #[arg(short, long, value_enum, default_value = "normal")]
    urgency: UrgencyArg,

    /// Quality tier, selects the revision limit
    #[arg(short, long, value_enum, default_value = "standard")]
    quality: QualityArg,

    /// Extra requirements passed to the writer
    #[arg(short, long)]
    requirements: Option<String>,

    /// Extra config file layered over config/default.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Abort the whole run after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Pretty-print the result JSON
    #[arg(long, default_value = "false")]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    observability::init();

    let config = load_config(args.config.clone()).context("Failed to load config")?;
    let llm = create_llm_from_config(&config);
    let factory = factory_from_config(&config, llm.clone());

    let mut request = ArticleRequest::new(args.topic)
        .source(args.source.into())
        .urgency(args.urgency.into())
        .quality(args.quality.into());
    if let Some(audience) = args.audience {
        request = request.audience(audience);
    }
    if let Some(requirements) = args.requirements {
        request = request.requirements(requirements);
    }

    let result = match args.deadline_secs {
        Some(secs) => {
            factory
                .generate_article_within(request, Duration::from_secs(secs))
                .await
        }
        None => factory.generate_article(request).await,
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("Failed to serialize result")?;
    println!("{}", json);

    let stats = factory.stats();
    tracing::info!(
        total = stats.total_runs,
        succeeded = stats.successful_runs,
        failed = stats.failed_runs,
        avg_secs = stats.average_duration_secs,
        "run stats"
    );
    if let Some(llm) = &llm {
        let (prompt, completion, total) = llm.token_usage();
        tracing::info!(prompt, completion, total, "token usage");
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
