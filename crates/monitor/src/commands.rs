use resource_monitor::units::{DurationUnit, StorageUnit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Text(String),
    Search(Option<String>),
    CpuUnit(DurationUnit),
    NetUnit(StorageUnit),
    RamUnit(StorageUnit),
    Units,
    View,
    Quit,
}

pub(crate) fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let command = match verb {
        "text" => Command::Text(rest.to_string()),
        "search" => Command::Search((!rest.is_empty()).then(|| rest.to_string())),
        "unit" => parse_unit_command(rest)?,
        "units" => Command::Units,
        "view" => Command::View,
        "quit" | "exit" => Command::Quit,
        other => anyhow::bail!("unknown command {other}"),
    };
    Ok(Some(command))
}

fn parse_unit_command(rest: &str) -> anyhow::Result<Command> {
    let mut parts = rest.split_whitespace();
    let (Some(family), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("usage: unit cpu|net|ram <unit>");
    };
    let command = match family {
        "cpu" => Command::CpuUnit(unit.parse()?),
        "net" => Command::NetUnit(unit.parse()?),
        "ram" => Command::RamUnit(unit.parse()?),
        other => anyhow::bail!("unknown unit family {other}, expected cpu, net or ram"),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_lines_and_comments() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# note").unwrap(), None);
    }

    #[test]
    fn parses_text_and_search() {
        assert_eq!(
            parse_command("text alice").unwrap(),
            Some(Command::Text("alice".to_string()))
        );
        assert_eq!(
            parse_command("text").unwrap(),
            Some(Command::Text(String::new()))
        );
        assert_eq!(parse_command("search").unwrap(), Some(Command::Search(None)));
        assert_eq!(
            parse_command("search  bob ").unwrap(),
            Some(Command::Search(Some("bob".to_string())))
        );
    }

    #[test]
    fn parses_unit_selection() {
        assert_eq!(
            parse_command("unit cpu s").unwrap(),
            Some(Command::CpuUnit(DurationUnit::Seconds))
        );
        assert_eq!(
            parse_command("unit ram megabytes").unwrap(),
            Some(Command::RamUnit(StorageUnit::Megabytes))
        );
        assert!(parse_command("unit disk kb").is_err());
        assert!(parse_command("unit cpu").is_err());
        assert!(parse_command("unit net kb extra").is_err());
        assert!(parse_command("unit net lightyears").is_err());
    }

    #[test]
    fn rejects_unknown_verbs() {
        let err = parse_command("refresh").unwrap_err();
        assert!(err.to_string().contains("unknown command refresh"));
        assert_eq!(parse_command("exit").unwrap(), Some(Command::Quit));
    }
}
