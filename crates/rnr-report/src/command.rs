/// A workflow command line: `::name[ params]::value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: &'a str,
    /// Everything between the name and the last `::`, leading space included.
    pub params: Option<&'a str>,
    pub value: &'a str,
}

/// Parse `line` as a workflow command.
///
/// The name runs up to the first space or `:`. With parameters present the
/// value starts after the *last* `::`; without them, after the first.
pub fn parse_command(line: &str) -> Option<Command<'_>> {
    let rest = line.strip_prefix("::")?;
    let name_len = rest.find([' ', ':']).unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let (name, rest) = rest.split_at(name_len);

    if let Some(value) = rest.strip_prefix("::") {
        return Some(Command {
            name,
            params: None,
            value,
        });
    }
    if rest.starts_with(' ') {
        let sep = rest.rfind("::")?;
        return Some(Command {
            name,
            params: Some(&rest[..sep]),
            value: &rest[sep + 2..],
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_command() {
        let cmd = parse_command("::add-mask::s3cr3t").unwrap();
        assert_eq!(cmd.name, "add-mask");
        assert_eq!(cmd.params, None);
        assert_eq!(cmd.value, "s3cr3t");
    }

    #[test]
    fn value_may_contain_separators() {
        let cmd = parse_command("::debug::a::b").unwrap();
        assert_eq!(cmd.value, "a::b");
    }

    #[test]
    fn params_extend_to_last_separator() {
        let cmd = parse_command("::notice file=a.rs,line=4::Careful::now").unwrap();
        assert_eq!(cmd.name, "notice");
        assert_eq!(cmd.params, Some(" file=a.rs,line=4::Careful"));
        assert_eq!(cmd.value, "now");
    }

    #[test]
    fn empty_value_and_terminator_shape() {
        let cmd = parse_command("::endgroup::").unwrap();
        assert_eq!(cmd.name, "endgroup");
        assert_eq!(cmd.value, "");
    }

    #[test]
    fn non_commands() {
        for line in [
            "hello",
            ":: leading space::x",
            "::::x",
            "::name:x",
            "::name x",
            " ::debug::x",
        ] {
            assert_eq!(parse_command(line), None, "{line:?}");
        }
    }
}
