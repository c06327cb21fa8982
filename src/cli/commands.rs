//! CLI command implementations.
//!
//! Store commands (`ingest`, `add`, `analytics`, `outline`, `search`) work
//! offline and need no API key. `query` and `chat` build the full
//! [`CourseAssistant`] and bridge into async with a tokio runtime.

use std::io::{self, BufRead, Write};
use std::path::Path;

#[cfg(feature = "mcp")]
use crate::cli::parser::McpCommands;
use crate::agent::{PromptSet, RagConfig, RagConfigBuilder, StoreConfig};
use crate::assistant::{CourseAssistant, CourseLibrary};
use crate::cli::output::{
    OutputFormat, format_analytics, format_answer, format_outline, format_search_results,
};
use crate::cli::parser::{Cli, Commands, QueryOptions};
use crate::core::SearchQuery;
use crate::error::{CommandError, Result};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Ingest { folder, clear } => {
            cmd_ingest(&store_config(cli)?, folder, *clear, format)
        }
        Commands::Add { file } => cmd_add(&store_config(cli)?, file, format),
        Commands::Analytics => cmd_analytics(&store_config(cli)?, format),
        Commands::Outline { course } => cmd_outline(&store_config(cli)?, course, format),
        Commands::Search {
            query,
            course,
            lesson,
            top_k,
        } => {
            let mut search = SearchQuery::new(query.as_str())
                .with_course(course.clone())
                .with_lesson(*lesson);
            if let Some(k) = top_k {
                search = search.with_limit(*k);
            }
            cmd_search(&store_config(cli)?, &search, format)
        }
        Commands::Query {
            text,
            session,
            options,
        } => {
            let assistant = CourseAssistant::from_config(&rag_config(cli, options)?)?;
            cmd_query(&assistant, text, session.as_deref(), format)
        }
        Commands::Chat { options } => {
            let assistant = CourseAssistant::from_config(&rag_config(cli, options)?)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            cmd_chat(&assistant, stdin.lock(), stdout.lock(), format)
        }
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
        #[cfg(feature = "mcp")]
        Commands::Mcp(sub) => {
            let options = QueryOptions::default();
            cmd_mcp(sub, &rag_config(cli, &options)?)
        }
    }
}

/// Builder seeded with CLI values; environment fills the rest.
fn config_builder(cli: &Cli, options: Option<&QueryOptions>) -> RagConfigBuilder {
    let mut builder = RagConfig::builder().db_path(cli.get_db_path());
    if let Some(options) = options {
        if let Some(mode) = options.mode {
            builder = builder.retrieval_mode(mode);
        }
        if let Some(model) = &options.model {
            builder = builder.model(model.as_str());
        }
        if let Some(dir) = &options.prompt_dir {
            builder = builder.prompt_dir(dir.as_path());
        }
    }
    builder.from_env()
}

fn store_config(cli: &Cli) -> Result<StoreConfig> {
    Ok(config_builder(cli, None).build_store()?)
}

fn rag_config(cli: &Cli, options: &QueryOptions) -> Result<RagConfig> {
    Ok(config_builder(cli, Some(options)).build()?)
}

fn tokio_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

// ==================== Command Implementations ====================

fn cmd_ingest(
    config: &StoreConfig,
    folder: &Path,
    clear: bool,
    format: OutputFormat,
) -> Result<String> {
    let library = CourseLibrary::open(config)?;
    let (courses, chunks) = library.add_course_folder(folder, clear)?;

    match format {
        OutputFormat::Text => Ok(format!(
            "Ingested {courses} course(s), {chunks} chunk(s) from: {}\n",
            folder.display()
        )),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "folder": folder.to_string_lossy(),
                "courses_added": courses,
                "chunks_added": chunks,
                "cleared": clear,
            });
            Ok(format.to_json(&json))
        }
    }
}

fn cmd_add(config: &StoreConfig, file: &Path, format: OutputFormat) -> Result<String> {
    let library = CourseLibrary::open(config)?;
    let (course, chunks) = library.add_course_document(file)?;

    match format {
        OutputFormat::Text => Ok(format!(
            "Added course '{}' ({} lesson(s), {chunks} chunk(s))\n",
            course.title,
            course.lessons.len()
        )),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "course": course,
                "chunks": chunks,
            });
            Ok(format.to_json(&json))
        }
    }
}

fn cmd_analytics(config: &StoreConfig, format: OutputFormat) -> Result<String> {
    let library = CourseLibrary::open(config)?;
    let analytics = library
        .analytics()
        .map_err(|e| CommandError::ExecutionFailed(format!("Analytics failed: {e}")))?;
    Ok(format_analytics(&analytics, format))
}

fn cmd_outline(config: &StoreConfig, course_name: &str, format: OutputFormat) -> Result<String> {
    let library = CourseLibrary::open(config)?;
    let course = library
        .outline(course_name)
        .map_err(|e| CommandError::ExecutionFailed(format!("Outline failed: {e}")))?
        .ok_or_else(|| {
            CommandError::ExecutionFailed(format!("No course found matching '{course_name}'"))
        })?;
    Ok(format_outline(&course, format))
}

fn cmd_search(config: &StoreConfig, query: &SearchQuery, format: OutputFormat) -> Result<String> {
    let library = CourseLibrary::open(config)?;
    let results = library.search(query);
    if let Some(e) = results.error() {
        return Err(CommandError::ExecutionFailed(format!("Search failed: {e}")).into());
    }
    Ok(format_search_results(&query.text, &results, format))
}

fn cmd_query(
    assistant: &CourseAssistant,
    query: &str,
    session_id: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let rt = tokio_runtime()?;
    let answer = rt
        .block_on(assistant.query(query, session_id))
        .map_err(|e| CommandError::ExecutionFailed(format!("Query failed: {e}")))?;
    Ok(format_answer(&answer, format))
}

/// Runs the interactive loop: one question per line, answers written as
/// they arrive. A failed query is reported and the loop continues.
fn cmd_chat<R: BufRead, W: Write>(
    assistant: &CourseAssistant,
    input: R,
    mut output: W,
    format: OutputFormat,
) -> Result<String> {
    let rt = tokio_runtime()?;
    let session_id = assistant.create_session();
    let io_err = |e: io::Error| CommandError::ExecutionFailed(format!("Chat I/O failed: {e}"));

    if format == OutputFormat::Text {
        writeln!(
            output,
            "Course assistant ({} mode, {session_id}). Type 'exit' to quit.",
            assistant.mode()
        )
        .map_err(io_err)?;
    }

    let mut answered = 0usize;
    for line in input.lines() {
        let line = line.map_err(io_err)?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit") {
            break;
        }

        match rt.block_on(assistant.query(query, Some(&session_id))) {
            Ok(answer) => {
                answered += 1;
                write!(output, "{}", format_answer(&answer, format)).map_err(io_err)?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat query failed");
                writeln!(output, "Error: {e}").map_err(io_err)?;
            }
        }
        if format == OutputFormat::Text {
            writeln!(output).map_err(io_err)?;
        }
        output.flush().map_err(io_err)?;
    }

    assistant.clear_session(&session_id);
    match format {
        OutputFormat::Text => Ok(format!("Answered {answered} question(s).\n")),
        OutputFormat::Json => Ok(String::new()),
    }
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(Path::to_path_buf)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str("  ");
                    output.push_str(
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown"),
                    );
                    output.push('\n');
                }
                output.push_str("\nEdit these files to customize the assistant's system prompt.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}

/// Starts the MCP server with the specified transport.
///
/// Runs until the client disconnects (stdio) or the server is stopped
/// (HTTP).
#[cfg(feature = "mcp")]
fn cmd_mcp(cmd: &McpCommands, config: &RagConfig) -> Result<String> {
    use crate::mcp::{CourseRagMcpServer, serve_http, serve_stdio};

    let server = CourseRagMcpServer::new(config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create MCP server: {e}"))
    })?;

    let rt = tokio_runtime()?;
    rt.block_on(async {
        match cmd {
            McpCommands::Stdio => serve_stdio(server).await,
            McpCommands::Serve { host, port } => serve_http(server, host, *port).await,
        }
    })
    .map_err(|e| CommandError::ExecutionFailed(format!("MCP server error: {e}")))?;

    Ok(String::new())
}
