//! Dot-command REPL over [`lod::Context`], matching the original
//! `lod-util` tool's command surface (§6): `.help .quit .exit .reset .dump
//! .doc .primary .fetch never|always|cond[itional]|absent .follow
//! .q <sparql>`, with bare input treated as a URI to resolve.

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use lod::{Context, FetchMode};
use oxigraph::sparql::QueryResults;
use std::io::{self, BufRead, Write};

#[derive(Debug, Parser)]
#[command(name = "lod")]
#[command(about = "Interactive resolver for Linked Open Data URIs")]
struct Cli {
    /// Verbose mode: raises the log level to debug.
    #[clap(long, short, action)]
    verbose: bool,
    /// Bound on redirect/autodiscovery hops per resolution (§4.6).
    #[clap(long, default_value_t = 32)]
    max_redirects: u32,
    /// Raw `Accept` header to send instead of the built-in preference list.
    #[clap(long)]
    accept: Option<String>,
    /// `User-Agent` header to send.
    #[clap(long)]
    user_agent: Option<String>,
}

enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("LOD_LOG", "debug");
    }
    lod::init_logging();

    let mut ctx = Context::new();
    configure(&mut ctx, &cli);

    println!("lod — type .help for commands, or a bare URI to resolve it");

    let stdin = io::stdin();
    let mut mode = FetchMode::Absent;
    loop {
        print!("lod> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match dispatch(&mut ctx, &mut mode, line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => eprintln!("error: {e:#}"),
        }
    }

    Ok(())
}

fn configure(ctx: &mut Context, cli: &Cli) {
    ctx.set_max_redirects(cli.max_redirects);
    ctx.set_verbose(cli.verbose);
    if let Some(ua) = &cli.user_agent {
        ctx.set_user_agent(ua.clone());
    }
    if let Some(accept) = &cli.accept {
        ctx.set_accept_header(accept.clone());
    }
}

fn dispatch(ctx: &mut Context, mode: &mut FetchMode, line: &str) -> Result<Flow> {
    if let Some(rest) = line.strip_prefix('.') {
        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or("");
        let arg = parts.next().unwrap_or("").trim();
        return run_command(ctx, mode, cmd, arg);
    }

    resolve_and_print(ctx, *mode, line)?;
    Ok(Flow::Continue)
}

fn run_command(ctx: &mut Context, mode: &mut FetchMode, cmd: &str, arg: &str) -> Result<Flow> {
    match cmd {
        "help" => {
            print_help();
            Ok(Flow::Continue)
        }
        "quit" | "exit" => Ok(Flow::Quit),
        "reset" => {
            reset_session(ctx);
            println!("session reset (model cleared, configuration kept)");
            Ok(Flow::Continue)
        }
        "dump" => {
            print!("{}", ctx.serialize_all()?);
            Ok(Flow::Continue)
        }
        "doc" => {
            match ctx.document() {
                Some(doc) => println!("{doc}"),
                None => println!("(no document resolved yet)"),
            }
            Ok(Flow::Continue)
        }
        "primary" => {
            print_primary_topic(ctx)?;
            Ok(Flow::Continue)
        }
        "fetch" => {
            *mode = parse_fetch_mode(arg)?;
            println!("fetch mode set to {}", arg.to_ascii_lowercase());
            Ok(Flow::Continue)
        }
        "follow" => {
            let now = !ctx.follow_primary_topic();
            ctx.set_follow_primary_topic(now);
            println!(
                "foaf:primaryTopic indirection {}",
                if now { "enabled" } else { "disabled" }
            );
            Ok(Flow::Continue)
        }
        "q" => {
            run_query(ctx, arg)?;
            Ok(Flow::Continue)
        }
        other => bail!("unknown command .{other} (try .help)"),
    }
}

fn parse_fetch_mode(arg: &str) -> Result<FetchMode> {
    match arg.to_ascii_lowercase().as_str() {
        "never" => Ok(FetchMode::Never),
        "always" => Ok(FetchMode::Always),
        "absent" | "cond" | "conditional" => Ok(FetchMode::Absent),
        "" => bail!("usage: .fetch never|always|cond[itional]|absent"),
        other => bail!("unrecognised fetch mode '{other}'"),
    }
}

fn resolve_and_print(ctx: &mut Context, mode: FetchMode, uri: &str) -> Result<()> {
    log::debug!("resolving {uri} in {mode:?} mode");
    match ctx.resolve_with_mode(uri, mode) {
        Ok(Some(handle)) => {
            println!("{} triples for <{}>", triple_count(&handle), handle.uri());
            for quad in handle.triples() {
                let quad = quad?;
                println!("  {} {} {} .", quad.subject, quad.predicate, quad.object);
            }
        }
        Ok(None) => println!("(absent: no triples found for <{uri}>)"),
        Err(e) => {
            println!("status={} error={}", ctx.status(), e);
        }
    }
    Ok(())
}

fn triple_count(handle: &lod::SubjectHandle<'_>) -> usize {
    handle.triples().filter(|t| t.is_ok()).count()
}

fn print_primary_topic(ctx: &Context) -> Result<()> {
    let subject = ctx
        .subject()
        .ok_or_else(|| anyhow!("no subject yet; resolve a URI first"))?
        .to_string();

    let query = format!(
        "SELECT ?o WHERE {{ <{subject}> <http://xmlns.com/foaf/0.1/primaryTopic> ?o }} LIMIT 1"
    );
    let topic = match ctx.query(&query)? {
        QueryResults::Solutions(mut solutions) => match solutions.next() {
            Some(Ok(solution)) => solution.get("o").map(|term| term.to_string()),
            _ => None,
        },
        _ => None,
    };

    match topic {
        Some(topic) => {
            println!("primary topic of <{subject}>: {topic}");
            let topic = topic.trim_start_matches('<').trim_end_matches('>');
            print!("{}", ctx.serialize_subject(topic)?);
        }
        None => println!("(no foaf:primaryTopic found for <{subject}>)"),
    }
    Ok(())
}

fn run_query(ctx: &Context, sparql: &str) -> Result<()> {
    if sparql.is_empty() {
        bail!("usage: .q <sparql query>");
    }
    match ctx.query(sparql)? {
        QueryResults::Solutions(solutions) => {
            for solution in solutions {
                let solution = solution?;
                let row: Vec<String> = solution
                    .iter()
                    .map(|(var, term)| format!("{var}={term}"))
                    .collect();
                println!("{}", row.join(" "));
            }
        }
        QueryResults::Boolean(b) => println!("{b}"),
        QueryResults::Graph(triples) => {
            for triple in triples {
                let triple = triple?;
                println!("{} {} {} .", triple.subject, triple.predicate, triple.object);
            }
        }
    }
    Ok(())
}

/// Replaces `ctx` with a fresh context sharing the same configuration but
/// an empty model, since `Context::reset` is a library-internal operation
/// scoped to one resolution call, not a CLI-visible "forget everything".
fn reset_session(ctx: &mut Context) {
    let cfg = ctx.config().clone();
    let mut fresh = Context::new();
    fresh.set_max_redirects(cfg.max_redirects);
    fresh.set_user_agent(cfg.user_agent);
    if let Some(accept) = cfg.accept_header_override {
        fresh.set_accept_header(accept);
    } else {
        fresh.set_accept_formats(cfg.accept_formats);
    }
    fresh.set_follow_primary_topic(cfg.follow_primary_topic);
    fresh.set_verbose(cfg.verbose);
    *ctx = fresh;
}

fn print_help() {
    println!(
        "\
.help                               show this message
.quit, .exit                        leave the REPL
.reset                               clear the in-memory model, keep configuration
.dump                                print every triple in the model as Turtle
.doc                                 print the last document that contributed triples
.primary                             follow foaf:primaryTopic from the current subject
.fetch never|always|cond|absent     set the resolution mode for bare URIs
.follow                              toggle automatic foaf:primaryTopic indirection
.q <sparql>                         run a SPARQL query against the model
<uri>                                resolve a URI using the current fetch mode"
    );
}
