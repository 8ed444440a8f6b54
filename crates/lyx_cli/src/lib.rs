pub mod args;

use std::io::{Read, Write};

use anyhow::{Context, Result};
use lyx_parser::parser::parse;
use lyx_parser::route::RouteFacts;
use lyx_parser::statement::Statement;
use tracing::debug;

use crate::args::{Arguments, OutputMode};

/// Parse every query given by the arguments and write the output for each
/// statement.
///
/// `stdin` is only read when no queries or files were given.
pub fn run(args: &Arguments, mut stdin: impl Read, out: &mut impl Write) -> Result<()> {
    let mut sources = Vec::new();
    for path in &args.files {
        let sql = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        sources.push(sql);
    }
    sources.extend(args.queries.iter().cloned());

    if sources.is_empty() {
        let mut sql = String::new();
        stdin
            .read_to_string(&mut sql)
            .context("failed to read queries from stdin")?;
        sources.push(sql);
    }

    for sql in &sources {
        let statements = parse(sql).with_context(|| format!("failed to parse: {sql}"))?;
        debug!(count = statements.len(), "writing statements");
        for statement in &statements {
            write_statement(args.output, statement, out)?;
        }
    }

    Ok(())
}

fn write_statement(mode: OutputMode, statement: &Statement, out: &mut impl Write) -> Result<()> {
    match mode {
        OutputMode::Tree => writeln!(out, "{statement:#?}")?,
        OutputMode::Route => {
            let facts = RouteFacts::from_statement(statement)
                .with_context(|| format!("failed to route {} statement", statement.kind()))?;
            writeln!(out, "{facts}")?;
        }
    }
    Ok(())
}
