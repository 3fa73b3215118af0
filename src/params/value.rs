use std::collections::HashMap;

/// Multivalued string parameters (query string, form fields, cookies).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    fields: HashMap<String, Vec<String>>,
}

impl Value {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value stored under `name`.
    pub fn set(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.fields.insert(name.into(), values);
    }

    /// Append one value to `name`, keeping earlier ones.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// First value for `name`, or an empty string.
    pub fn get(&self, name: &str) -> &str {
        self.get_all(name)
            .and_then(<[String]>::first)
            .map_or("", String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Copy of this container restricted to the given keys.
    pub fn filter(&self, names: &[&str]) -> Self {
        let fields = names
            .iter()
            .filter_map(|name| {
                self.fields
                    .get(*name)
                    .map(|values| ((*name).to_string(), values.clone()))
            })
            .collect();
        Self { fields }
    }

    /// Check that every name has a non-empty first value.
    ///
    /// Returns the overall validity and, per missing key, its messages.
    pub fn require(&self, names: &[&str]) -> (bool, HashMap<String, Vec<String>>) {
        let mut messages: HashMap<String, Vec<String>> = HashMap::new();

        for name in names {
            if self.get(name).is_empty() {
                messages
                    .entry((*name).to_string())
                    .or_default()
                    .push(format!("Missing required parameter {name}."));
            }
        }

        (messages.is_empty(), messages)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut value = Self::new();
        for (name, v) in iter {
            value.append(name, v);
        }
        value
    }
}
