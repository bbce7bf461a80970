#![no_main]

use libfuzzer_sys::fuzz_target;
use promptsql_core::templater::{render_prompt, template_variables};
use std::collections::BTreeMap;

fuzz_target!(|data: &[u8]| {
    if let Ok(template) = std::str::from_utf8(data) {
        let bindings: BTreeMap<String, serde_json::Value> = template_variables(template)
            .into_iter()
            .map(|name| (name.clone(), serde_json::Value::String(name)))
            .collect();
        let _ = render_prompt(template, &bindings);
    }
});
