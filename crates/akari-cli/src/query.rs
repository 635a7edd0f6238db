//! Read-only inspection commands.

use clap::Subcommand;

/// Sub-commands available under `circle`.
#[derive(Debug, Subcommand)]
pub enum CircleCommands {
    /// Show global circle members by rank
    Show {
        /// Maximum number of members to show
        #[arg(long, default_value = "50")]
        limit: i64,
    },
}

/// Sub-commands available under `competitors`.
#[derive(Debug, Subcommand)]
pub enum CompetitorsCommands {
    /// Show the stored competitor list for a project
    Show {
        /// Project slug (e.g. lido-finance)
        slug: String,
    },
}

/// Sub-commands available under `runs`.
#[derive(Debug, Subcommand)]
pub enum RunsCommands {
    /// List recent engine runs, newest first
    List {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Show one engine run with its counters
    Show {
        /// Engine run id
        id: i64,
    },
}

/// Sub-commands available under `profile`.
#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    /// Show a stored profile and its latest scores
    Show {
        /// X handle, with or without a leading @
        handle: String,
    },
}

/// Print the global circle, best rank first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn show_circle(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let members = akari_db::list_global_circle(pool, Some(limit.max(0))).await?;

    if members.is_empty() {
        println!("global circle is empty; run `akari-cli run` first");
        return Ok(());
    }

    println!(
        "{:>5}  {:<24} {:>8} {:>9}  SEGMENT",
        "RANK", "HANDLE", "AKARI", "INFLUENCE"
    );
    for m in &members {
        println!(
            "{:>5}  {:<24} {:>8.1} {:>9.1}  {}",
            m.rank, m.handle, m.akari_score, m.influence_score, m.segment
        );
    }
    Ok(())
}

/// Print a project's stats and competitor edges.
///
/// # Errors
///
/// Returns an error if the project does not exist or a query fails.
pub(crate) async fn show_competitors(pool: &sqlx::PgPool, slug: &str) -> anyhow::Result<()> {
    let project = akari_db::get_project_by_slug(pool, slug)
        .await?
        .ok_or_else(|| anyhow::anyhow!("project '{slug}' not found"))?;

    println!(
        "{} (@{}): circle {} members, power {:.1}, quality ratio {:.2}",
        project.name,
        project.x_handle.as_deref().unwrap_or("?"),
        project.inner_circle_count,
        project.inner_circle_power,
        project.quality_follower_ratio,
    );

    let edges = akari_db::list_project_competitors(pool, project.id).await?;
    if edges.is_empty() {
        println!("no competitors recorded");
        return Ok(());
    }

    println!(
        "{:>4}  {:<24} {:>10} {:>6} {:>8}",
        "RANK", "COMPETITOR", "SIMILARITY", "COMMON", "POWER"
    );
    for e in &edges {
        println!(
            "{:>4}  {:<24} {:>10.3} {:>6} {:>8.1}",
            e.rank, e.competitor_slug, e.similarity, e.common_count, e.common_power
        );
    }
    Ok(())
}

/// Print recent engine runs.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn list_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = akari_db::list_engine_runs(pool, limit.max(0)).await?;

    if runs.is_empty() {
        println!("no engine runs recorded");
        return Ok(());
    }

    println!(
        "{:>6}  {:<10} {:<10} {:<20} {:>7} {:>7} {:>8}",
        "ID", "STATUS", "TRIGGER", "STARTED", "CIRCLE", "EDGES", "FAILURES"
    );
    for r in &runs {
        println!(
            "{:>6}  {:<10} {:<10} {:<20} {:>7} {:>7} {:>8}",
            r.id,
            r.status,
            r.trigger_source,
            format_time(r.started_at),
            r.global_circle_size,
            r.competitor_edges,
            r.failures,
        );
    }
    Ok(())
}

/// Print one engine run.
///
/// # Errors
///
/// Returns an error if the run does not exist or the query fails.
pub(crate) async fn show_run(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<()> {
    let run = match akari_db::get_engine_run(pool, id).await {
        Ok(run) => run,
        Err(akari_db::DbError::NotFound) => anyhow::bail!("engine run {id} not found"),
        Err(e) => return Err(e.into()),
    };

    println!("run {} ({})", run.id, run.public_id);
    println!("  status:              {}", run.status);
    println!("  trigger:             {}", run.trigger_source);
    println!("  started:             {}", format_time(run.started_at));
    println!("  completed:           {}", format_time(run.completed_at));
    println!("  profiles discovered: {}", run.profiles_discovered);
    println!("  profiles scored:     {}", run.profiles_scored);
    println!("  global circle size:  {}", run.global_circle_size);
    println!("  projects processed:  {}", run.projects_processed);
    println!("  competitor edges:    {}", run.competitor_edges);
    println!("  failures:            {}", run.failures);
    if let Some(message) = &run.error_message {
        println!("  error:               {message}");
    }
    Ok(())
}

/// Print a stored profile.
///
/// # Errors
///
/// Returns an error if the profile does not exist or the query fails.
pub(crate) async fn show_profile(pool: &sqlx::PgPool, handle: &str) -> anyhow::Result<()> {
    let profile = akari_db::get_profile_by_handle(pool, handle)
        .await?
        .ok_or_else(|| anyhow::anyhow!("profile '{handle}' not found"))?;

    println!(
        "@{} ({})",
        profile.handle,
        profile.display_name.as_deref().unwrap_or("-")
    );
    println!(
        "  followers {}, following {}, tweets {}, verified {}",
        profile.followers_count, profile.following_count, profile.tweet_count, profile.is_verified
    );
    println!("  akari:        {}", format_score(profile.akari_score));
    println!("  authenticity: {}", format_score(profile.authenticity_score));
    println!("  influence:    {}", format_score(profile.influence_score));
    println!("  signal:       {}", format_score(profile.signal_score));
    println!("  farm risk:    {}", format_score(profile.farm_risk_score));
    println!("  last scored:  {}", format_time(profile.last_scored_at));
    Ok(())
}

fn format_time(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{s:.1}"))
}
