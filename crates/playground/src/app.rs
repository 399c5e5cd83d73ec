//! Command dispatch
//!
//! Each command takes the completion client and the output writer as
//! arguments so the flows can be exercised without a network or a terminal.

use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{WrapErr, eyre};
use playground_core::{
    CompletionClient, OpenAiClient, ParameterSet, ProgressCallback, PromptContext, ResultRecord,
    SweepSummary, generate, render_and_persist, run_sweep_with_progress,
};

use crate::cli::{Command, GenerateArgs, PromptArgs, SweepArgs};
use crate::config::{ConfigError, PlaygroundConfig, check_parameters, fill_subject};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const DOTENV_FILE_NAME: &str = ".env";

/// Run a parsed command against the given data directory
pub fn run(command: Command, data_dir: &Path) -> color_eyre::Result<()> {
    let mut stdout = std::io::stdout().lock();

    match command {
        Command::Generate(args) => {
            let config = load_config(data_dir)?;
            let client = client_from_env(&config, data_dir)?;
            generate_description(&config, &args, &client, &mut stdout)
        }
        Command::Sweep(args) => {
            let config = load_config(data_dir)?;
            let client = client_from_env(&config, data_dir)?;
            generate_all(&config, &args, &client, &mut stdout).map(|_| ())
        }
        Command::Models => list_models(&load_config(data_dir)?, &mut stdout),
        Command::InitConfig { force } => init_config(data_dir, force, &mut stdout),
    }
}

fn load_config(data_dir: &Path) -> color_eyre::Result<PlaygroundConfig> {
    PlaygroundConfig::load_or_default(data_dir)
        .wrap_err_with(|| format!("Failed to load config from {}", data_dir.display()))
}

fn client_from_env(
    config: &PlaygroundConfig,
    data_dir: &Path,
) -> color_eyre::Result<OpenAiClient> {
    let timeout = config.request_timeout()?;
    let api_key = api_key(data_dir).ok_or_else(|| eyre!("{API_KEY_VAR} is not set"))?;

    Ok(OpenAiClient::with_options(&config.api_base, api_key, timeout))
}

/// The API key from the environment, falling back to `{data_dir}/.env`
pub fn api_key(data_dir: &Path) -> Option<String> {
    resolve_api_key(std::env::var(API_KEY_VAR).ok(), data_dir)
}

fn resolve_api_key(from_env: Option<String>, data_dir: &Path) -> Option<String> {
    let usable = |key: &String| !key.trim().is_empty();
    from_env
        .filter(usable)
        .or_else(|| dotenv_value(&data_dir.join(DOTENV_FILE_NAME), API_KEY_VAR).filter(usable))
}

/// Look up `key` in a `.env` file without touching the process environment
fn dotenv_value(path: &Path, key: &str) -> Option<String> {
    let entries = dotenvy::from_path_iter(path).ok()?;
    entries
        .filter_map(Result::ok)
        .find_map(|(name, value)| (name == key).then_some(value))
}

/// Build the fixed request context from config plus overrides
///
/// Returns the context together with the resolved subject.
pub fn prompt_context(
    config: &PlaygroundConfig,
    args: &PromptArgs,
) -> Result<(PromptContext, String), ConfigError> {
    let model = args.model.as_deref().unwrap_or(&config.model);
    config.check_model(model)?;

    let subject = args.subject.clone().unwrap_or_else(|| config.subject.clone());
    let system_prompt = args.system_prompt.as_deref().unwrap_or(&config.system_prompt);
    let user_prompt = args.user_prompt.as_deref().unwrap_or(&config.user_prompt);
    let stop = args.stop.clone().unwrap_or_else(|| config.stop_sequence.clone());

    let context = PromptContext::new(model, system_prompt, fill_subject(user_prompt, &subject))
        .with_stop_sequence(Some(stop));

    Ok((context, subject))
}

/// Parameters for a single generation, config defaults overridden by flags
pub fn generation_parameters(
    config: &PlaygroundConfig,
    args: &GenerateArgs,
) -> Result<ParameterSet, ConfigError> {
    let defaults = &config.generation;
    let parameters = ParameterSet::new(
        args.temperature.unwrap_or(defaults.temperature),
        args.max_tokens.unwrap_or(defaults.max_tokens),
        args.presence_penalty.unwrap_or(defaults.presence_penalty),
        args.frequency_penalty.unwrap_or(defaults.frequency_penalty),
    );
    check_parameters(&parameters)?;
    Ok(parameters)
}

/// The single "Generate" flow
pub fn generate_description<C, W>(
    config: &PlaygroundConfig,
    args: &GenerateArgs,
    client: &C,
    out: &mut W,
) -> color_eyre::Result<()>
where
    C: CompletionClient + ?Sized,
    W: Write,
{
    let (context, _subject) = prompt_context(config, &args.prompt)?;
    let parameters = generation_parameters(config, args)?;

    let description = generate(&context, &parameters, client)
        .map_err(|e| eyre!("Error generating description: {e}"))?;

    writeln!(out, "Generated Description")?;
    writeln!(out)?;
    let p = &parameters;
    writeln!(out, "Parameters Used:")?;
    writeln!(out, "- Temperature: {}", p.temperature())?;
    writeln!(out, "- Max Tokens: {}", p.max_tokens())?;
    writeln!(out, "- Presence Penalty: {}", p.presence_penalty())?;
    writeln!(out, "- Frequency Penalty: {}", p.frequency_penalty())?;
    writeln!(out, "---")?;
    writeln!(out, "Description:")?;
    writeln!(out, "{description}")?;
    Ok(())
}

/// The "Generate All" flow: sweep, print the table, save it
///
/// Returns the path of the saved table.
pub fn generate_all<C, W>(
    config: &PlaygroundConfig,
    args: &SweepArgs,
    client: &C,
    out: &mut W,
) -> color_eyre::Result<PathBuf>
where
    C: CompletionClient + ?Sized,
    W: Write,
{
    config.check_axes()?;
    let (context, subject) = prompt_context(config, &args.prompt)?;
    let output_dir = args.output_dir.as_deref().unwrap_or(&config.output_dir);

    let grid = config.axes.grid();
    let progress: ProgressCallback = Box::new(report_progress);
    let records = run_sweep_with_progress(&grid, &context, client, Some(progress));
    let summary = SweepSummary::from_records(&records);

    let report = render_and_persist(&records, output_dir, &subject);

    writeln!(out, "Generated Descriptions")?;
    writeln!(out)?;
    write!(out, "{}", report.table.render())?;
    writeln!(out)?;
    writeln!(
        out,
        "{} of {} combinations succeeded",
        summary.succeeded, summary.total
    )?;

    let path = report.saved.wrap_err("Failed to save results")?;
    writeln!(out, "All results saved to {}", path.display())?;
    Ok(path)
}

fn report_progress(done: usize, total: usize, record: &ResultRecord) {
    let p = record.parameters();
    let status = if record.outcome().is_success() {
        "ok"
    } else {
        "error"
    };
    eprintln!(
        "[{done}/{total}] temperature={} max_tokens={} presence={} frequency={} {status}",
        p.temperature(),
        p.max_tokens(),
        p.presence_penalty(),
        p.frequency_penalty()
    );
}

pub fn list_models<W: Write>(config: &PlaygroundConfig, out: &mut W) -> color_eyre::Result<()> {
    for model in &config.models {
        let marker = if *model == config.model { "*" } else { " " };
        writeln!(out, "{marker} {model}")?;
    }
    Ok(())
}

pub fn init_config<W: Write>(data_dir: &Path, force: bool, out: &mut W) -> color_eyre::Result<()> {
    let path = PlaygroundConfig::path(data_dir);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path).into());
    }

    let path = PlaygroundConfig::default().save(data_dir)?;
    tracing::info!(path = %path.display(), "Wrote default config");
    writeln!(out, "Wrote {}", path.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_core::{CompletionError, CompletionRequest, ResultTable, SweepAxes};
    use std::fs;
    use tempfile::TempDir;

    fn small_config(output_dir: &Path) -> PlaygroundConfig {
        PlaygroundConfig {
            user_prompt: "Describe the {product}.".into(),
            output_dir: output_dir.to_path_buf(),
            axes: SweepAxes {
                temperatures: vec![0.0, 0.7],
                max_tokens: vec![50, 150],
                presence_penalties: vec![0.0],
                frequency_penalties: vec![0.0],
            },
            ..Default::default()
        }
    }

    fn fails_on_150(request: &CompletionRequest<'_>) -> Result<String, CompletionError> {
        if request.parameters.max_tokens() == 150 {
            Err(CompletionError::Api {
                status: 400,
                message: "bad max_tokens".into(),
            })
        } else {
            Ok(format!("{} at {}", request.user, request.parameters.temperature()))
        }
    }

    #[test]
    fn test_api_key_from_dotenv_file() {
        let temp_dir = TempDir::new().unwrap();
        let dotenv = temp_dir.path().join(DOTENV_FILE_NAME);
        assert_eq!(resolve_api_key(None, temp_dir.path()), None);

        let contents = "# local secrets\nOTHER_KEY=1\nOPENAI_API_KEY=sk-from-file\n";
        fs::write(&dotenv, contents).unwrap();

        let key = resolve_api_key(None, temp_dir.path());
        assert_eq!(key.as_deref(), Some("sk-from-file"));

        let key = resolve_api_key(Some("sk-from-env".into()), temp_dir.path());
        assert_eq!(key.as_deref(), Some("sk-from-env"));

        let key = resolve_api_key(Some("  ".into()), temp_dir.path());
        assert_eq!(key.as_deref(), Some("sk-from-file"));
    }

    #[test]
    fn test_blank_dotenv_key_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let dotenv = temp_dir.path().join(DOTENV_FILE_NAME);
        fs::write(&dotenv, "OPENAI_API_KEY=\n").unwrap();

        assert_eq!(resolve_api_key(None, temp_dir.path()), None);
    }

    #[test]
    fn test_client_from_env_uses_data_dir_dotenv() {
        let temp_dir = TempDir::new().unwrap();
        let dotenv = temp_dir.path().join(DOTENV_FILE_NAME);
        fs::write(&dotenv, "OPENAI_API_KEY=sk-from-file\n").unwrap();
        let config = PlaygroundConfig {
            api_base: "http://127.0.0.1:9/v1/".into(),
            ..Default::default()
        };

        let client = client_from_env(&config, temp_dir.path()).unwrap();
        assert_eq!(client.api_base(), "http://127.0.0.1:9/v1");
    }

    #[test]
    fn test_client_from_env_rejects_zero_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let dotenv = temp_dir.path().join(DOTENV_FILE_NAME);
        fs::write(&dotenv, "OPENAI_API_KEY=sk-from-file\n").unwrap();
        let config = PlaygroundConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };

        let err = client_from_env(&config, temp_dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "request timeout must be positive");
    }

    #[test]
    fn test_prompt_context_uses_overrides() {
        let config = small_config(Path::new("."));
        let args = PromptArgs {
            subject: Some("Tesla".into()),
            model: Some("gpt-4".into()),
            stop: Some("END".into()),
            ..Default::default()
        };

        let (context, subject) = prompt_context(&config, &args).unwrap();
        assert_eq!(subject, "Tesla");
        assert_eq!(context.model_id(), "gpt-4");
        assert_eq!(context.user_text(), "Describe the Tesla.");
        assert_eq!(context.system_text(), config.system_prompt);
        assert_eq!(context.stop_sequence(), Some("END"));
    }

    #[test]
    fn test_prompt_context_defaults() {
        let config = small_config(Path::new("."));
        let (context, subject) = prompt_context(&config, &PromptArgs::default()).unwrap();

        assert_eq!(subject, "iPhone");
        assert_eq!(context.model_id(), "gpt-3.5-turbo");
        assert_eq!(context.user_text(), "Describe the iPhone.");
        assert_eq!(context.stop_sequence(), None);
    }

    #[test]
    fn test_prompt_context_rejects_unknown_model() {
        let config = small_config(Path::new("."));
        let args = PromptArgs {
            model: Some("davinci".into()),
            ..Default::default()
        };
        assert!(matches!(
            prompt_context(&config, &args),
            Err(ConfigError::UnknownModel { .. })
        ));
    }

    #[test]
    fn test_generation_parameters() {
        let config = PlaygroundConfig::default();
        let args = GenerateArgs {
            temperature: Some(1.2),
            ..Default::default()
        };

        let params = generation_parameters(&config, &args).unwrap();
        assert_eq!(params, ParameterSet::new(1.2, 150, 0.0, 0.0));

        let args = GenerateArgs {
            temperature: Some(5.0),
            ..Default::default()
        };
        assert!(generation_parameters(&config, &args).is_err());
    }

    #[test]
    fn test_generate_description_output() {
        let config = small_config(Path::new("."));
        let mut out = Vec::new();

        let args = GenerateArgs::default();
        let result = generate_description(&config, &args, &fails_on_150, &mut out);
        assert!(result.is_err());
        assert!(out.is_empty());

        let args = GenerateArgs {
            max_tokens: Some(50),
            ..Default::default()
        };
        generate_description(&config, &args, &fails_on_150, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("- Max Tokens: 50"));
        assert!(text.contains("- Temperature: 0.7"));
        assert!(text.ends_with("Description:\nDescribe the iPhone. at 0.7\n"));
    }

    #[test]
    fn test_generate_description_error_message() {
        let config = small_config(Path::new("."));
        let err = generate_description(
            &config,
            &GenerateArgs::default(),
            &fails_on_150,
            &mut Vec::new(),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error generating description: API error (HTTP 400): bad max_tokens"
        );
    }

    #[test]
    fn test_generate_all_saves_table() {
        let temp_dir = TempDir::new().unwrap();
        let config = small_config(temp_dir.path());
        let args = SweepArgs {
            prompt: PromptArgs {
                subject: Some("running shoes".into()),
                ..Default::default()
            },
            output_dir: None,
        };
        let mut out = Vec::new();

        let path = generate_all(&config, &args, &fails_on_150, &mut out).unwrap();

        assert_eq!(
            path,
            temp_dir.path().join("running shoes_all_descriptions.csv")
        );
        let table = ResultTable::load(&path).unwrap();
        let descriptions: Vec<&str> = table
            .rows()
            .iter()
            .map(|r| r.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "Describe the running shoes. at 0",
                "Error: API error (HTTP 400): bad max_tokens",
                "Describe the running shoes. at 0.7",
                "Error: API error (HTTP 400): bad max_tokens",
            ]
        );

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2 of 4 combinations succeeded"));
        assert!(text.contains("All results saved to"));
    }

    #[test]
    fn test_generate_all_rejects_empty_axis() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = small_config(temp_dir.path());
        config.axes.presence_penalties.clear();

        let calls = std::cell::Cell::new(0);
        let client = |_: &CompletionRequest<'_>| {
            calls.set(calls.get() + 1);
            Ok::<_, CompletionError>(String::new())
        };

        let result = generate_all(&config, &SweepArgs::default(), &client, &mut Vec::new());
        assert!(result.is_err());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_list_models_marks_default() {
        let mut out = Vec::new();
        list_models(&PlaygroundConfig::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "* gpt-3.5-turbo\n  gpt-4\n");
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let mut out = Vec::new();

        init_config(temp_dir.path(), false, &mut out).unwrap();
        assert!(init_config(temp_dir.path(), false, &mut out).is_err());
        init_config(temp_dir.path(), true, &mut out).unwrap();

        let loaded = PlaygroundConfig::load_or_default(temp_dir.path()).unwrap();
        assert_eq!(loaded, PlaygroundConfig::default());
    }
}
