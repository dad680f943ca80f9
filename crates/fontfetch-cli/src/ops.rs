//! Command handlers wiring the CLI onto the core drivers.

use crate::args::{self, CacheCommand, Cli, Commands, ConfigCommand};
use anyhow::{Context as _, Result};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use fontfetch_core::config::{self, Context};
use fontfetch_core::fetch::{GithubClient, ReleaseSpec};
use fontfetch_core::install::{install_repo, InstallOutcome, InstallRequest, RepoSpec};
use fontfetch_core::inspect;
use fontfetch_core::library::{self, ExportedLibrary};
use fontfetch_core::manifest::InstalledManifest;
use fontfetch_core::repair::{apply_fixup, plan_fixups};
use fontfetch_core::select::parse_weights;
use fontfetch_core::uninstall::uninstall_repos;
use fontfetch_core::update::update_repos;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Output controls resolved from the global CLI flags
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub quiet: bool,
    pub verbose: bool,
}

impl OutputOptions {
    fn should_print(&self) -> bool {
        !self.quiet
    }
}

fn log_status(opts: &OutputOptions, message: &str) {
    if opts.should_print() {
        println!("{message}");
    }
}

fn log_verbose(opts: &OutputOptions, message: &str) {
    if opts.verbose && !opts.quiet {
        eprintln!("{message}");
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let opts = OutputOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Install {
            repos,
            release,
            format,
            local,
            force,
            weights,
            style,
        } => handle_install(&opts, repos, release, format, local, force, weights, style),
        Commands::Uninstall { repos, force } => handle_uninstall(&opts, repos, force),
        Commands::Update { repos, changelog } => handle_update(&opts, repos, changelog),
        Commands::Export { output, stdout } => handle_export(&opts, output, stdout),
        Commands::Import {
            input,
            force,
            local,
        } => handle_import(&opts, input, force, local),
        Commands::Fix {
            backup,
            granular,
            yes,
        } => handle_fix(&opts, backup, granular, yes),
        Commands::IsVariable { font_path } => handle_is_variable(font_path),
        Commands::Config(command) => handle_config(&opts, command),
        Commands::Cache(command) => handle_cache(&opts, command),
        Commands::Completions { shell } => handle_completions(shell),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_install(
    opts: &OutputOptions,
    repos: Vec<String>,
    release: String,
    format: Option<String>,
    local: bool,
    force: bool,
    weights: Option<String>,
    style: args::StyleArg,
) -> Result<()> {
    let ctx = Context::from_disk()?;
    let priorities = args::resolve_priorities(format.as_deref(), &ctx.config.priorities)?;
    let weights = weights
        .as_deref()
        .map(parse_weights)
        .transpose()?
        .unwrap_or_default();
    let release = ReleaseSpec::from_arg(&release);
    let client = GithubClient::new(ctx.config.github_token.clone())?;
    log_verbose(
        opts,
        &format!(
            "Format priorities: {}",
            priorities
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    );

    for repo_arg in &repos {
        let spec = match RepoSpec::parse(repo_arg) {
            Ok(spec) => spec,
            Err(e) => {
                log::error!("{e}");
                continue;
            }
        };
        log_status(opts, &format!("Installing from {}...", spec.describe()));

        let mut request = InstallRequest::new(spec, release.clone(), priorities.clone());
        request.weights = weights.clone();
        request.styles = style.into();
        request.local = local;
        request.force = force;

        match install_repo(&ctx, &client, &request) {
            Ok(outcome) => report_install_outcome(opts, repo_arg, &outcome),
            Err(e) => log::error!("error installing from {repo_arg}: {e}"),
        }
    }
    Ok(())
}

fn report_install_outcome(opts: &OutputOptions, repo_arg: &str, outcome: &InstallOutcome) {
    match outcome {
        InstallOutcome::Installed {
            count,
            version,
            dest,
            ..
        } => log_status(
            opts,
            &format!(
                "✅ Moved {count} font{} from {repo_arg} {version} to: {}",
                if *count == 1 { "" } else { "s" },
                dest.display()
            ),
        ),
        InstallOutcome::AlreadyInstalled { version } => log_status(
            opts,
            &format!("{repo_arg} {version} is already installed; use --force to reinstall"),
        ),
        InstallOutcome::NothingSelected => log_status(
            opts,
            &format!("No matching font files found for {repo_arg}."),
        ),
        InstallOutcome::SkippedWebFormats => log_status(
            opts,
            "Skipped: WOFF/WOFF2 fonts are not recommended for global installs; use --force or --local.",
        ),
    }
}

fn handle_uninstall(opts: &OutputOptions, repos: Vec<String>, force: bool) -> Result<()> {
    let ctx = Context::from_disk()?;
    let report = uninstall_repos(&ctx, &repos, force)?;
    log_status(
        opts,
        &format!(
            "Uninstalled {} font{}.",
            report.deleted,
            if report.deleted == 1 { "" } else { "s" }
        ),
    );
    Ok(())
}

fn handle_update(opts: &OutputOptions, repos: Vec<String>, changelog: bool) -> Result<()> {
    let ctx = Context::from_disk()?;
    let client = GithubClient::new(ctx.config.github_token.clone())?;
    let report = update_repos(&ctx, &client, &repos, changelog)?;
    log_status(
        opts,
        &format!(
            "Updated {} of {} checked repo{}.",
            report.updated,
            report.checked,
            if report.checked == 1 { "" } else { "s" }
        ),
    );
    Ok(())
}

fn handle_export(opts: &OutputOptions, output: PathBuf, stdout: bool) -> Result<()> {
    let ctx = Context::from_disk()?;
    let manifest = InstalledManifest::load(&ctx.manifest_path);
    if manifest.is_empty() {
        log_status(opts, "No installed fonts data found.");
        return Ok(());
    }

    let exported = library::export_library(&manifest);
    let json = serde_json::to_string_pretty(&exported)?;
    if stdout {
        println!("{json}");
    } else {
        fs::write(&output, json)
            .with_context(|| format!("error writing to {}", output.display()))?;
        log_status(opts, &format!("Exported to {}", output.display()));
    }
    Ok(())
}

fn handle_import(opts: &OutputOptions, input: PathBuf, force: bool, local: bool) -> Result<()> {
    let content = fs::read_to_string(&input)
        .with_context(|| format!("error loading {}", input.display()))?;
    let exported: ExportedLibrary = serde_json::from_str(&content)
        .with_context(|| format!("error parsing {}", input.display()))?;

    let ctx = Context::from_disk()?;
    let client = GithubClient::new(ctx.config.github_token.clone())?;
    for request in library::plan_import(&exported, local, force) {
        log_status(
            opts,
            &format!("Installing from {}...", request.spec.describe()),
        );
        let key = request.repo_key.clone();
        match install_repo(&ctx, &client, &request) {
            Ok(outcome) => report_install_outcome(opts, &key, &outcome),
            Err(e) => log::error!("error installing from {key}: {e}"),
        }
    }
    Ok(())
}

fn handle_fix(opts: &OutputOptions, backup: bool, granular: bool, yes: bool) -> Result<()> {
    let ctx = Context::from_disk()?;
    let mut manifest = InstalledManifest::load(&ctx.manifest_path);
    if manifest.is_empty() {
        log_status(opts, "No installed fonts data found.");
        return Ok(());
    }

    if backup {
        let backup_path = ctx.manifest_path.with_extension("json.backup");
        fs::copy(&ctx.manifest_path, &backup_path).context("failed to create backup")?;
        log_status(opts, &format!("Backup created: {}", backup_path.display()));
    }

    let fixups = plan_fixups(&manifest, ctx.font_dir());
    if fixups.is_empty() {
        log_status(opts, "No issues found.");
        return Ok(());
    }

    if !granular {
        log_status(opts, &format!("Found {} issue(s):", fixups.len()));
        for fixup in &fixups {
            log_status(opts, &format!("  {}", fixup.description()));
        }
        if !yes && !confirm("Proceed with fixes?", true)? {
            log_status(opts, "Aborted.");
            return Ok(());
        }
    }

    // reinstalls re-run the install pipeline with the repo's recorded source
    let provenance: BTreeMap<String, (String, String)> = manifest
        .iter()
        .filter_map(|(key, fonts)| {
            fonts
                .values()
                .next()
                .map(|record| (key.clone(), (record.owner.clone(), record.repo_name.clone())))
        })
        .collect();
    let client = GithubClient::new(ctx.config.github_token.clone())?;
    let mut reinstall = |key: &str| -> bool {
        let Some((owner, repo_name)) = provenance.get(key) else {
            log::warn!("no recorded source for {key}; cannot reinstall");
            return false;
        };
        if owner.is_empty() {
            log::warn!("no recorded owner for {key}; cannot reinstall");
            return false;
        }
        let request =
            InstallRequest::reinstall(owner, repo_name, key, ctx.config.priorities.clone());
        match install_repo(&ctx, &client, &request) {
            Ok(_) => true,
            Err(e) => {
                log::error!("failed to reinstall {key}: {e}");
                false
            }
        }
    };

    let mut fixed = 0;
    let mut dirty = false;
    for fixup in &fixups {
        if granular {
            log_status(opts, &fixup.description());
            if !yes && !confirm("Fix this?", true)? {
                continue;
            }
        }
        if fixup.is_reinstall() {
            // flush pending manifest edits first: the reinstall loads and
            // saves the manifest file itself
            if dirty {
                manifest.save(&ctx.manifest_path)?;
                dirty = false;
            }
            fixed += apply_fixup(&mut manifest, fixup, &mut reinstall);
            manifest = InstalledManifest::load(&ctx.manifest_path);
        } else {
            fixed += apply_fixup(&mut manifest, fixup, &mut reinstall);
            dirty = true;
        }
        log_status(opts, &fixup.done_description());
    }
    if dirty {
        manifest.save(&ctx.manifest_path)?;
    }

    log_status(opts, &format!("Fixed {fixed} issue(s)."));
    Ok(())
}

fn handle_is_variable(font_path: PathBuf) -> Result<()> {
    if inspect::is_variable_font(&font_path)? {
        println!("This is a variable font.");
    } else {
        println!("This is a static font.");
    }
    Ok(())
}

fn handle_config(opts: &OutputOptions, command: ConfigCommand) -> Result<()> {
    let (key, value) = match &command {
        ConfigCommand::Get { key } => {
            let config = fontfetch_core::config::Config::load(&config::config_file());
            let value = match key.as_str() {
                "format" => config
                    .priorities
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
                "path" => config.font_dir.display().to_string(),
                "cache-size" => config.cache_size.to_string(),
                "github_token" => match config.github_token {
                    Some(_) => "***".to_string(),
                    None => "(unset)".to_string(),
                },
                other => anyhow::bail!("unknown config key: {other}"),
            };
            println!("{value}");
            return Ok(());
        }
        ConfigCommand::Format { value } => ("format", value.as_str()),
        ConfigCommand::Path { value } => ("path", value.as_str()),
        ConfigCommand::CacheSize { value } => ("cache-size", value.as_str()),
        ConfigCommand::Token { value } => ("github_token", value.as_str()),
    };
    fontfetch_core::config::Config::set(&config::config_file(), key, value)?;
    let shown = if key == "github_token" { "***" } else { value };
    log_status(opts, &format!("Set {key} to: {shown}"));
    Ok(())
}

fn handle_cache(opts: &OutputOptions, command: CacheCommand) -> Result<()> {
    match command {
        CacheCommand::Purge => {
            let ctx = Context::from_disk()?;
            match &ctx.cache {
                Some(cache) => {
                    cache.purge()?;
                    log_status(opts, "Cache purged.");
                }
                None => log_status(opts, "Cache is disabled."),
            }
        }
    }
    Ok(())
}

fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();
    generate(shell, &mut command, bin_name, &mut io::stdout());
    Ok(())
}

fn confirm(prompt: &str, default_yes: bool) -> Result<bool> {
    print!("{prompt} [{}] ", if default_yes { "Y/n" } else { "y/N" });
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(match line.trim().to_lowercase().as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    })
}
