use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelSchema {
    #[default]
    Host,
    Docker,
}

impl LabelSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSchema::Host => "host",
            LabelSchema::Docker => "docker",
        }
    }
}

/// A runner label in `name[:schema[:arg]]` form, e.g. `ubuntu:docker://node:20`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub schema: LabelSchema,
    pub arg: String,
}

impl FromStr for Label {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(ModelError::EmptyLabel);
        }
        let schema = match parts.next() {
            None | Some("host") => LabelSchema::Host,
            Some("docker") => LabelSchema::Docker,
            Some(other) => return Err(ModelError::UnsupportedSchema(other.to_string())),
        };
        Ok(Label {
            name: name.to_string(),
            schema,
            arg: parts.next().unwrap_or_default().to_string(),
        })
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.schema.as_str())?;
        if !self.arg.is_empty() {
            write!(f, ":{}", self.arg)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels(pub Vec<Label>);

impl Labels {
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|l| l.name.clone()).collect()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(Label::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_defaults_to_host() {
        let label: Label = "linux".parse().unwrap();
        assert_eq!(label.schema, LabelSchema::Host);
        assert_eq!(label.to_string(), "linux:host");
    }

    #[test]
    fn docker_arg_keeps_colons() {
        let label: Label = "ubuntu:docker://node:20-bookworm".parse().unwrap();
        assert_eq!(label.name, "ubuntu");
        assert_eq!(label.schema, LabelSchema::Docker);
        assert_eq!(label.arg, "//node:20-bookworm");
        assert_eq!(label.to_string(), "ubuntu:docker://node:20-bookworm");
    }

    #[test]
    fn unknown_schema_and_empty_name_are_errors() {
        assert_eq!(
            "x:vm".parse::<Label>(),
            Err(ModelError::UnsupportedSchema("vm".into()))
        );
        assert_eq!(":host".parse::<Label>(), Err(ModelError::EmptyLabel));
    }
}
