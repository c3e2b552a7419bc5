//! Argument parsing and command dispatch (§6): the `clap`-derived surface,
//! help styling, and the handlers that translate parsed arguments into calls
//! against `worktree`/`navigation`/`status`/`rebase`/`display`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use clap::builder::styling::{AnsiColor, Color, Styles};
use clap::{Command, CommandFactory, Parser, Subcommand};

use crate::config::GlobalConfig;
use crate::context::WorkstackContext;
use crate::error::WsError;
use crate::rebase::ConflictStrategy;
use crate::shell::Shell;
use crate::styling::{print, println, WARNING_EMOJI};
use crate::{display, navigation, rebase, status, worktree};

const DEFAULT_COMMAND_NAME: &str = "ws";

const HELP_TEMPLATE: &str = "\
{before-help}{name} - {about-with-newline}\
Usage: {usage}

{all-args}{after-help}";

fn help_styles() -> Styles {
    Styles::styled()
        .header(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .usage(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .literal(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .placeholder(anstyle::Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .error(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red))))
        .valid(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(anstyle::Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
}

/// Build the top-level [`Command`] with the shared help template applied
/// recursively to every subcommand.
pub fn build_command() -> Command {
    apply_help_template_recursive(Cli::command(), DEFAULT_COMMAND_NAME)
}

fn apply_help_template_recursive(mut cmd: Command, path: &str) -> Command {
    cmd = cmd.help_template(HELP_TEMPLATE).display_name(path);
    for sub in cmd.get_subcommands_mut() {
        let sub_cmd = std::mem::take(sub);
        let sub_path = format!("{path} {}", sub_cmd.get_name());
        *sub = apply_help_template_recursive(sub_cmd, &sub_path);
    }
    cmd
}

fn version_str() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| env!("CARGO_PKG_VERSION").to_string())
}

#[derive(Parser)]
#[command(name = "ws")]
#[command(about = "Manages git worktrees, with optional stacked-diff and PR-host integration")]
#[command(version = version_str())]
#[command(disable_help_subcommand = true)]
#[command(styles = help_styles())]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Run as if invoked from this directory
    #[arg(short = 'C', global = true, value_name = "path", help_heading = "Global Options")]
    pub directory: Option<PathBuf>,

    /// Print what would happen without changing anything
    #[arg(long, global = true, help_heading = "Global Options")]
    pub dry_run: bool,

    /// Show the underlying commands being run
    #[arg(long, short = 'v', global = true, help_heading = "Global Options")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new managed worktree (§4.D)
    Create {
        name: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        plan: Option<PathBuf>,
        #[arg(long, requires = "plan")]
        keep_plan: bool,
        #[arg(long, conflicts_with = "from_branch")]
        from_current_branch: bool,
        #[arg(long)]
        from_branch: Option<String>,
        #[arg(long)]
        no_post: bool,
    },
    /// List managed worktrees
    List {
        #[arg(long)]
        stacks: bool,
    },
    /// Render the branch-graph tree for the active worktrees
    Tree,
    /// Aggregate and print this worktree's status (§4.F)
    Status,
    /// Rename a managed worktree in place
    Rename { old: String, new: String },
    /// Move or swap a worktree's branch
    Move {
        #[arg(long, conflicts_with_all = ["branch", "worktree"])]
        current: bool,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        worktree: Option<String>,
        target: String,
        #[arg(long, short = 'f')]
        force: bool,
        #[arg(long = "ref")]
        ref_name: Option<String>,
    },
    /// Remove a managed worktree
    #[command(alias = "remove")]
    Rm {
        name: String,
        #[arg(short = 'f', long)]
        force: bool,
        #[arg(short = 's', long)]
        delete_stack: bool,
    },
    /// List worktrees whose PR is merged or closed
    Gc,
    /// Invoke the stacked-diff tool's sync
    Sync {
        #[arg(short = 'f', long)]
        force: bool,
    },
    /// Activate a worktree in the calling shell
    Switch {
        name: Option<String>,
        #[arg(long, conflicts_with = "down")]
        up: bool,
        #[arg(long)]
        down: bool,
        #[arg(long)]
        script: bool,
    },
    /// Shortcut for `switch --up`
    Up {
        #[arg(long)]
        script: bool,
    },
    /// Shortcut for `switch --down`
    Down {
        #[arg(long)]
        script: bool,
    },
    /// Jump directly to the worktree holding `branch`
    Jump {
        branch: String,
        #[arg(long)]
        script: bool,
    },
    /// Rebase orchestration (§4.G)
    #[command(subcommand)]
    Rebase(RebaseCommand),
    /// Read or write the global configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// First-time setup
    Init {
        #[arg(long)]
        repo: bool,
        #[arg(long)]
        preset: Option<String>,
        #[arg(long)]
        list_presets: bool,
        #[arg(long, value_enum)]
        shell: Option<Shell>,
        #[arg(long)]
        force: bool,
    },
    /// Stacked-diff tool passthroughs
    #[command(subcommand)]
    Graphite(GraphiteCommand),
}

#[derive(Subcommand)]
pub enum RebaseCommand {
    /// Create the scratch rebase stack and attempt the rebase
    Preview {
        branch: String,
        #[arg(long)]
        force: bool,
    },
    /// Fast-forward the real branch to the scratch stack's result
    Apply {
        branch: String,
        #[arg(long)]
        force: bool,
    },
    /// Apply a conflict-resolution strategy to every conflicted file
    Resolve {
        branch: String,
        #[arg(long, value_enum, default_value = "ours")]
        strategy: ResolveStrategyArg,
    },
    /// Run (or auto-detect) the project's test command in the scratch stack
    Test {
        branch: String,
        #[arg(long)]
        command: Option<String>,
    },
    /// Show commits unique to the scratch stack versus the source branch
    Compare { branch: String },
    /// Discard the scratch rebase stack
    Abort { branch: Option<String> },
    /// Show in-progress rebase stacks
    Status { branch: Option<String> },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ResolveStrategyArg {
    Ours,
    Theirs,
}

impl From<ResolveStrategyArg> for ConflictStrategy {
    fn from(value: ResolveStrategyArg) -> Self {
        match value {
            ResolveStrategyArg::Ours => ConflictStrategy::Ours,
            ResolveStrategyArg::Theirs => ConflictStrategy::Theirs,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print every global config key and its current value
    List,
    /// Print one global config key's value
    Get { key: String },
    /// Set one global config key
    Set { key: String, value: String },
    /// Generate a shell completion script
    Completion {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum GraphiteCommand {
    /// Print the cached branch graph
    Branches {
        #[arg(long, value_enum, default_value = "text")]
        format: GraphiteFormat,
    },
    /// Run the stacked-diff tool's sync
    Sync {
        #[arg(short = 'f', long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum GraphiteFormat {
    Text,
    Json,
}

/// Resolve `repo_root`/`repo_name` from the directory the command was run
/// in, then dispatch to the matching handler.
pub fn run(cli: Cli, caller_dir: &Path) -> Result<(), WsError> {
    let ctx = crate::create_context(cli.dry_run);

    match cli.command {
        Commands::Create {
            name,
            branch,
            plan,
            keep_plan,
            from_current_branch,
            from_branch,
            no_post,
        } => {
            let (repo_root, repo_name) = discover_repo(&ctx, caller_dir)?;
            let outcome = worktree::create(
                &ctx,
                &repo_root,
                caller_dir,
                &repo_name,
                worktree::CreateOptions {
                    name,
                    branch,
                    plan,
                    keep_plan,
                    from_current_branch,
                    from_branch,
                    no_post,
                },
            )?;
            println!("created worktree at {}", outcome.worktree.path.display());
            for failure in &outcome.post_create_failures {
                println!(
                    "{} post-create command `{}` exited {}: {}",
                    WARNING_EMOJI,
                    failure.command,
                    failure.exit_code,
                    failure.stderr_tail
                );
            }
            Ok(())
        }
        Commands::List { stacks } => cmd_list(&ctx, caller_dir, stacks),
        Commands::Tree => cmd_tree(&ctx, caller_dir),
        Commands::Status => cmd_status(&ctx, caller_dir),
        Commands::Rename { old, new } => {
            let (repo_root, repo_name) = discover_repo(&ctx, caller_dir)?;
            let renamed = worktree::rename(&ctx, &repo_root, &repo_name, &old, &new)?;
            println!("renamed to {}", renamed.path.display());
            Ok(())
        }
        Commands::Move {
            current,
            branch,
            worktree: worktree_name,
            target,
            force,
            ref_name,
        } => {
            let (repo_root, repo_name) = discover_repo(&ctx, caller_dir)?;
            let source = resolve_move_source(current, branch, worktree_name)?;
            let target = if target == "root" {
                worktree::MoveTarget::Root
            } else {
                worktree::MoveTarget::Worktree(target)
            };
            worktree::move_or_swap(&ctx, &repo_root, caller_dir, &repo_name, source, target, force, ref_name)
        }
        Commands::Rm { name, force, delete_stack } => {
            let (repo_root, repo_name) = discover_repo(&ctx, caller_dir)?;
            worktree::remove(&ctx, &repo_root, &repo_name, &name, force, delete_stack)
        }
        Commands::Gc => cmd_gc(&ctx, caller_dir),
        Commands::Sync { force } => {
            let (repo_root, _) = discover_repo(&ctx, caller_dir)?;
            ctx.stacked.sync(&repo_root, force)
        }
        Commands::Switch { name, up, down, script } => cmd_switch(&ctx, caller_dir, name, up, down, script),
        Commands::Up { script } => cmd_boundary(&ctx, caller_dir, script, true),
        Commands::Down { script } => cmd_boundary(&ctx, caller_dir, script, false),
        Commands::Jump { branch, script } => {
            let (repo_root, _) = discover_repo(&ctx, caller_dir)?;
            let target = navigation::jump(&ctx, &repo_root, &branch)?;
            emit_activation(&target.path, script)
        }
        Commands::Rebase(cmd) => cmd_rebase(&ctx, caller_dir, cmd),
        Commands::Config(cmd) => cmd_config(&ctx, cmd),
        Commands::Init { repo, preset, list_presets, shell, force } => {
            cmd_init(&ctx, caller_dir, repo, preset, list_presets, shell, force)
        }
        Commands::Graphite(cmd) => cmd_graphite(&ctx, caller_dir, cmd),
    }
}

fn resolve_move_source(
    current: bool,
    branch: Option<String>,
    worktree_name: Option<String>,
) -> Result<worktree::MoveSource, WsError> {
    match (current, branch, worktree_name) {
        (true, None, None) => Ok(worktree::MoveSource::Current),
        (false, Some(b), None) => Ok(worktree::MoveSource::Branch(b)),
        (false, None, Some(w)) => Ok(worktree::MoveSource::Worktree(w)),
        (false, None, None) => Ok(worktree::MoveSource::Current),
        _ => Err(WsError::usage("pass exactly one of --current, --branch, --worktree")),
    }
}

/// Resolve the root worktree's path and this repository's managed name from
/// a directory inside any of its worktrees. `git rev-parse --git-common-dir`
/// returns the shared `.git` directory regardless of which worktree you're
/// standing in; its parent is the root worktree.
fn discover_repo(ctx: &WorkstackContext, caller_dir: &Path) -> Result<(PathBuf, String), WsError> {
    let common = ctx.vcs.common_dir(caller_dir)?;
    let repo_root = common
        .parent()
        .ok_or_else(|| WsError::precondition("could not determine the repository root"))?
        .to_path_buf();
    let repo_name = repo_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| WsError::precondition("repository root has no directory name"))?;
    Ok((repo_root, repo_name))
}

fn emit_activation(target: &Path, script: bool) -> Result<(), WsError> {
    if script {
        let path = navigation::write_activation_script(target)?;
        println!("{}", path.display());
    } else {
        println!("{}", target.display());
    }
    Ok(())
}

fn cmd_switch(
    ctx: &WorkstackContext,
    caller_dir: &Path,
    name: Option<String>,
    up: bool,
    down: bool,
    script: bool,
) -> Result<(), WsError> {
    if up {
        return cmd_boundary(ctx, caller_dir, script, true);
    }
    if down {
        return cmd_boundary(ctx, caller_dir, script, false);
    }
    let name = name.ok_or_else(|| WsError::usage("switch requires a worktree name, or --up/--down"))?;
    let (_, repo_name) = discover_repo(ctx, caller_dir)?;
    let global = ctx.global_config.load()?;
    let path = global.workstacks_root.join(&repo_name).join(&name);
    if !path.exists() {
        return Err(WsError::not_found(format!("no worktree named '{name}'")));
    }
    emit_activation(&path, script)
}

fn cmd_boundary(ctx: &WorkstackContext, caller_dir: &Path, script: bool, up: bool) -> Result<(), WsError> {
    let (repo_root, _) = discover_repo(ctx, caller_dir)?;
    let outcome = if up {
        navigation::up(ctx, &repo_root, caller_dir)?
    } else {
        navigation::down(ctx, &repo_root, caller_dir)?
    };
    match outcome {
        navigation::BoundaryOutcome::Activated(target) => emit_activation(&target.path, script),
        navigation::BoundaryOutcome::AlreadyAtTop => {
            println!("already at the top of the stack");
            Ok(())
        }
        navigation::BoundaryOutcome::AlreadyAtBottom => {
            println!("already at the bottom of the stack");
            Ok(())
        }
    }
}

fn cmd_list(ctx: &WorkstackContext, caller_dir: &Path, stacks: bool) -> Result<(), WsError> {
    let (repo_root, _) = discover_repo(ctx, caller_dir)?;
    let worktrees = ctx.vcs.list_worktrees(&repo_root)?;
    if !stacks {
        for wt in &worktrees {
            println!(
                "{}  {}",
                wt.name(),
                wt.branch.as_deref().unwrap_or("(detached)")
            );
        }
        return Ok(());
    }

    let graph = crate::branch_graph::require(&ctx.vcs.common_dir(&repo_root)?)?;
    let global = ctx.global_config.load()?;
    for wt in &worktrees {
        let Some(branch) = &wt.branch else { continue };
        println!("{}:", wt.name());
        let entries = navigation::stack_slice(ctx, &repo_root, &graph, branch, wt.is_root)?;
        let rendered = if global.show_pr_info {
            display::render_stack_slice(&entries, |b| pr_badge_for(ctx, &repo_root, b, global.show_pr_checks))
        } else {
            display::render_stack_slice(&entries, |_| None)
        };
        println!("{rendered}");
    }
    Ok(())
}

/// Look up and render the PR badge for `branch` (§4.E "list --stacks": "PR
/// badges for each branch are appended when `show_pr_info` is on"). Prefers
/// the stacked-diff tool's cache over the PR-host CLI, same preference order
/// as the status pipeline's PR collector (§4.F #2).
fn pr_badge_for(ctx: &WorkstackContext, repo_root: &Path, branch: &str, show_checks: bool) -> Option<String> {
    let info = ctx
        .stacked
        .cached_pr_info(repo_root, branch)
        .ok()
        .flatten()
        .or_else(|| ctx.pr_host.pr_for_branch(repo_root, branch).ok().flatten())?;

    let ready_to_merge = info.state == crate::model::PrState::Open
        && !info.is_draft
        && !matches!(info.checks_passing, crate::model::ChecksStatus::Failing);
    let status = status::PrStatus {
        number: info.number,
        state: info.state,
        url: info.url,
        is_draft: info.is_draft,
        checks_passing: info.checks_passing,
        ready_to_merge,
    };
    Some(display::render_pr_badge(&status, show_checks))
}

fn cmd_tree(ctx: &WorkstackContext, caller_dir: &Path) -> Result<(), WsError> {
    let (repo_root, _) = discover_repo(ctx, caller_dir)?;
    let roots = navigation::build_tree(ctx, &repo_root, caller_dir)?;
    print!("{}", display::render_tree(&roots));
    Ok(())
}

fn cmd_status(ctx: &WorkstackContext, caller_dir: &Path) -> Result<(), WsError> {
    let (repo_root, _) = discover_repo(ctx, caller_dir)?;
    let is_root = ctx
        .vcs
        .list_worktrees(&repo_root)?
        .into_iter()
        .find(|w| w.path == caller_dir)
        .map(|w| w.is_root)
        .unwrap_or(caller_dir == repo_root);
    let result = status::collect(
        ctx,
        &repo_root,
        caller_dir,
        is_root,
        status::DEFAULT_COLLECTOR_TIMEOUT,
    );
    print!("{}", display::render_status(&result));
    Ok(())
}

fn cmd_gc(ctx: &WorkstackContext, caller_dir: &Path) -> Result<(), WsError> {
    let (repo_root, repo_name) = discover_repo(ctx, caller_dir)?;
    let candidates = worktree::gc(ctx, &repo_root, &repo_name)?;
    if candidates.is_empty() {
        println!("nothing to garbage-collect");
        return Ok(());
    }
    for candidate in &candidates {
        println!(
            "{}  {}",
            candidate.worktree.name(),
            candidate.removal_command
        );
    }
    Ok(())
}

fn cmd_rebase(ctx: &WorkstackContext, caller_dir: &Path, cmd: RebaseCommand) -> Result<(), WsError> {
    let (repo_root, _) = discover_repo(ctx, caller_dir)?;
    match cmd {
        RebaseCommand::Preview { branch, force } => {
            let default_branch = ctx.vcs.default_branch(&repo_root)?;
            let stack = rebase::preview(ctx, &repo_root, &branch, &default_branch, force)?;
            println!("{} commits to rebase", stack.commits_to_rebase.len());
            Ok(())
        }
        RebaseCommand::Apply { branch, force } => {
            rebase::apply(ctx, &repo_root, &branch, force)?;
            println!("applied");
            Ok(())
        }
        RebaseCommand::Resolve { branch, strategy } => {
            rebase::resolve(ctx, &repo_root, &branch, strategy.into())?;
            println!("resolved");
            Ok(())
        }
        RebaseCommand::Test { branch, command } => {
            let result = rebase::test(ctx, &repo_root, &branch, command.as_deref())?;
            println!(
                "{}  ({})",
                if result.passed { "PASSED" } else { "FAILED" },
                result.command
            );
            println!("{}", result.output);
            Ok(())
        }
        RebaseCommand::Compare { branch } => {
            let commits = rebase::compare(ctx, &repo_root, &branch)?;
            for commit in commits {
                println!("{}  {}", commit.short_sha, commit.message);
            }
            Ok(())
        }
        RebaseCommand::Abort { branch } => {
            let branch = resolve_rebase_branch(ctx, caller_dir, branch)?;
            rebase::abort(ctx, &repo_root, &branch)
        }
        RebaseCommand::Status { branch } => {
            let stacks = rebase::status(ctx, &repo_root)?;
            for stack in stacks {
                if let Some(only) = &branch
                    && &stack.source_branch != only
                {
                    continue;
                }
                println!("{}  {:?}", stack.source_branch, stack.status);
            }
            Ok(())
        }
    }
}

fn resolve_rebase_branch(
    ctx: &WorkstackContext,
    caller_dir: &Path,
    branch: Option<String>,
) -> Result<String, WsError> {
    if let Some(branch) = branch {
        return Ok(branch);
    }
    ctx.vcs
        .current_branch(caller_dir)?
        .ok_or_else(|| WsError::usage("no branch given and the current worktree is in detached HEAD"))
}

fn cmd_config(ctx: &WorkstackContext, cmd: ConfigCommand) -> Result<(), WsError> {
    match cmd {
        ConfigCommand::List => {
            let config = ctx.global_config.load()?;
            print_config_table(&config);
            Ok(())
        }
        ConfigCommand::Get { key } => {
            let config = ctx.global_config.load()?;
            let value = config_get(&config, &key)?;
            println!("{value}");
            Ok(())
        }
        ConfigCommand::Set { key, value } => {
            let mut config = ctx.global_config.load()?;
            config_set(&mut config, &key, &value)?;
            ctx.global_config.save(&config)
        }
        ConfigCommand::Completion { shell } => {
            let mut cmd = build_command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn print_config_table(config: &GlobalConfig) {
    println!("workstacks_root = {}", config.workstacks_root.display());
    println!("use_graphite = {}", config.use_graphite);
    println!("show_pr_info = {}", config.show_pr_info);
    println!("show_pr_checks = {}", config.show_pr_checks);
    println!("shell_setup_complete = {}", config.shell_setup_complete);
    println!("rebase.use_stacks = {}", config.rebase.use_stacks);
    println!("rebase.auto_test = {}", config.rebase.auto_test);
    println!("rebase.preserve_stacks = {}", config.rebase.preserve_stacks);
    println!("rebase.conflict_tool = {}", config.rebase.conflict_tool);
    println!("rebase.stack_location = {}", config.rebase.stack_location);
}

fn config_get(config: &GlobalConfig, key: &str) -> Result<String, WsError> {
    Ok(match key {
        "workstacks_root" => config.workstacks_root.display().to_string(),
        "use_graphite" => config.use_graphite.to_string(),
        "show_pr_info" => config.show_pr_info.to_string(),
        "show_pr_checks" => config.show_pr_checks.to_string(),
        "shell_setup_complete" => config.shell_setup_complete.to_string(),
        "rebase.use_stacks" => config.rebase.use_stacks.to_string(),
        "rebase.auto_test" => config.rebase.auto_test.to_string(),
        "rebase.preserve_stacks" => config.rebase.preserve_stacks.to_string(),
        "rebase.conflict_tool" => config.rebase.conflict_tool.clone(),
        "rebase.stack_location" => config.rebase.stack_location.clone(),
        other => return Err(WsError::usage(format!("unknown config key '{other}'"))),
    })
}

fn config_set(config: &mut GlobalConfig, key: &str, value: &str) -> Result<(), WsError> {
    fn parse_bool(value: &str) -> Result<bool, WsError> {
        value
            .parse()
            .map_err(|_| WsError::usage(format!("'{value}' is not a valid boolean")))
    }

    match key {
        "workstacks_root" => config.workstacks_root = PathBuf::from(value),
        "use_graphite" => config.use_graphite = parse_bool(value)?,
        "show_pr_info" => config.show_pr_info = parse_bool(value)?,
        "show_pr_checks" => config.show_pr_checks = parse_bool(value)?,
        "shell_setup_complete" => config.shell_setup_complete = parse_bool(value)?,
        "rebase.use_stacks" => config.rebase.use_stacks = parse_bool(value)?,
        "rebase.auto_test" => config.rebase.auto_test = parse_bool(value)?,
        "rebase.preserve_stacks" => config.rebase.preserve_stacks = parse_bool(value)?,
        "rebase.conflict_tool" => config.rebase.conflict_tool = value.to_string(),
        "rebase.stack_location" => config.rebase.stack_location = value.to_string(),
        other => return Err(WsError::usage(format!("unknown config key '{other}'"))),
    }
    Ok(())
}

fn cmd_init(
    ctx: &WorkstackContext,
    caller_dir: &Path,
    repo: bool,
    preset: Option<String>,
    list_presets: bool,
    shell: Option<Shell>,
    force: bool,
) -> Result<(), WsError> {
    if list_presets {
        println!("no presets are bundled yet");
        return Ok(());
    }
    let _ = preset;

    if !ctx.global_config.exists() || force {
        ctx.global_config.save(&GlobalConfig::default())?;
        println!("wrote global config to {}", ctx.global_config.path().display());
    }

    if repo {
        let (repo_root, repo_name) = discover_repo(ctx, caller_dir)?;
        let global = ctx.global_config.load()?;
        let repo_dir = global.workstacks_root.join(&repo_name);
        std::fs::create_dir_all(&repo_dir)
            .map_err(|e| WsError::external(e.to_string(), "create repo config directory".to_string()))?;
        let config_path = repo_dir.join("config.toml");
        if force || !config_path.exists() {
            std::fs::write(&config_path, "[env]\n[post_create]\nshell = \"bash\"\ncommands = []\n")
                .map_err(|e| WsError::external(e.to_string(), "write repo config".to_string()))?;
        }
        let _ = repo_root;
    }

    if let Some(shell) = shell {
        let home = home::home_dir().ok_or_else(|| WsError::precondition("could not determine home directory"))?;
        let rc_file = shell.rc_file(&home);
        let line = shell.config_line("ws");
        let existing = std::fs::read_to_string(&rc_file).unwrap_or_default();
        if !existing.contains(&line) {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&rc_file)
                .map_err(|e| WsError::external(e.to_string(), "open shell rc file".to_string()))?;
            writeln!(file, "{line}")
                .map_err(|e| WsError::external(e.to_string(), "write shell rc file".to_string()))?;
        }
        let mut global = ctx.global_config.load()?;
        global.shell_setup_complete = true;
        ctx.global_config.save(&global)?;
    }

    Ok(())
}

fn cmd_graphite(ctx: &WorkstackContext, caller_dir: &Path, cmd: GraphiteCommand) -> Result<(), WsError> {
    let (repo_root, _) = discover_repo(ctx, caller_dir)?;
    match cmd {
        GraphiteCommand::Branches { format } => {
            let graph = crate::branch_graph::require(&ctx.vcs.common_dir(&repo_root)?)?;
            match format {
                GraphiteFormat::Text => {
                    for name in graph.names() {
                        let node = graph.get(name).expect("name came from graph.names()");
                        println!(
                            "{name}  parent={}",
                            node.parent.as_deref().unwrap_or("(trunk)")
                        );
                    }
                }
                GraphiteFormat::Json => {
                    let entries: Vec<_> = graph
                        .names()
                        .map(|name| {
                            let node = graph.get(name).expect("name came from graph.names()");
                            serde_json::json!({
                                "name": name,
                                "parent": node.parent,
                                "children": node.children,
                                "is_trunk": node.is_trunk_marker,
                            })
                        })
                        .collect();
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&entries).unwrap_or_default()
                    );
                }
            }
            Ok(())
        }
        GraphiteCommand::Sync { force } => ctx.stacked.sync(&repo_root, force),
    }
}
