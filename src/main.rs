use anyhow::{Context as _, Result};
use clap::Parser;
use nc_filter::catalog::MemoryCatalog;
use nc_filter::compiler::{CompileOptions, CompileOutput, PredicateCompiler};
use nc_filter::config::CompilerConfig;
use nc_filter::dialect::DialectKind;
use nc_filter::{parse_filter, Dialect, FilterNode};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 将过滤表达式编译为 SQL
#[derive(Parser, Debug)]
#[command(name = "nc-filter")]
#[command(about = "Compile filter expressions into SQL predicates")]
struct Args {
    /// JSON 配置文件（方言、严格模式、目录路径）
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// 过滤所针对的模型 id
    #[arg(short = 'm', long = "model")]
    model: String,

    /// 语义错误直接失败
    #[arg(long = "strict", default_value = "false")]
    strict: bool,

    /// 覆盖配置文件中的方言
    #[arg(short = 'd', long = "dialect", value_enum)]
    dialect: Option<DialectKind>,

    /// 要编译的过滤表达式；省略时进入交互模式
    #[arg(short = 'f', long = "filter")]
    filter: Option<String>,
}

struct Session {
    catalog: MemoryCatalog,
    dialect: &'static dyn Dialect,
    model: String,
    table: String,
    strict: bool,
}

impl Session {
    async fn run(&self, input: &str) -> Result<()> {
        // 以 { 开头的输入按 JSON 树解析，否则按文本语法解析
        let node = if input.trim_start().starts_with('{') {
            FilterNode::from_json(input).context("无法解析过滤树 JSON")?
        } else {
            parse_filter(input)?
        };
        println!("[过滤树]:\n{}", serde_json::to_string_pretty(&node)?);
        println!("[规范文本]: {node}");

        let options = CompileOptions::default().strict(self.strict);
        let output = PredicateCompiler::new(&self.catalog, self.dialect)
            .compile(&node, &self.model, &options)
            .await?;
        self.print_output(&output);
        Ok(())
    }

    fn print_output(&self, output: &CompileOutput) {
        let select = output.predicate.select_all(&self.table, None);
        println!("[生成的 SQL] ({}):\n{}", self.dialect.name(), self.dialect.render(&select));
        debug!(aliases = output.aliases_minted, "compiled");
        if !output.dropped.is_empty() {
            println!("[丢弃的条件]:");
            for dropped in &output.dropped {
                println!("• {}: {}", dropped.field, dropped.reason);
            }
        }
    }
}

fn load(args: &Args) -> Result<Session> {
    let (config, catalog_path) = match &args.config {
        Some(path) => {
            let config = CompilerConfig::from_json_file(path)?;
            let catalog_path = config.catalog_path(path);
            (config, catalog_path)
        }
        None => (CompilerConfig::default(), None),
    };

    let catalog = match &catalog_path {
        Some(path) => MemoryCatalog::from_json_file(path)
            .with_context(|| format!("无法加载目录 {}", path.display()))?,
        None => MemoryCatalog::new(),
    };
    let table = catalog.table_name(&args.model)?.to_string();
    let dialect = args.dialect.unwrap_or(config.dialect).adapter();
    info!(
        model = %args.model,
        table = %table,
        dialect = dialect.name(),
        columns = catalog.columns.len(),
        "loaded catalog"
    );

    Ok(Session {
        catalog,
        dialect,
        model: args.model.clone(),
        table,
        strict: args.strict || config.strict,
    })
}

async fn repl(session: &Session) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("输入过滤表达式，例如 (title,eq,Widget)~or(amount,gt,5)；Ctrl-D 退出");
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                if let Err(e) = session.run(line).await {
                    println!("✗ {e:#}");
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let session = load(&args)?;

    match &args.filter {
        Some(filter) => session.run(filter).await,
        None => repl(&session).await,
    }
}
