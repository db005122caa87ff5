use anyhow::bail;

/// Field values of the hello scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Greeting {
    pub scenario: String,
    pub summary: String,
    pub first_name: String,
    pub last_name: String,
    pub result: String,
}

impl Greeting {
    pub fn new(
        scenario: impl Into<String>,
        summary: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        result: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let greeting = Self {
            scenario: scenario.into(),
            summary: summary.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            result: result.into(),
        };
        for (field, v) in [
            ("scenario", &greeting.scenario),
            ("first name", &greeting.first_name),
            ("last name", &greeting.last_name),
            ("result", &greeting.result),
        ] {
            if v.contains(['\'', '\n', '\r']) {
                bail!("{field} `{v}` cannot hold a quote or line break");
            }
        }
        if greeting.summary.contains(['\n', '\r']) {
            bail!("summary cannot span lines");
        }
        Ok(greeting)
    }

    pub fn hello(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        result: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Self::new(
            "hello",
            "This is explaining what is going on",
            first_name,
            last_name,
            result,
        )
    }

    pub fn render(&self) -> String {
        format!(
            "
Scenario '{}': {}

    Given that my name is '{}' '{}'
    and that the result is '{}'
    Then say hello
    and print all data
",
            self.scenario, self.summary, self.first_name, self.last_name, self.result
        )
    }
}
