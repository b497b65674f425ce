pub(crate) mod table;

use table::{IntoTable, Table};

use crate::cli::provider_from_config;
use crate::config::Config;
use crate::providers::{ChatProvider, Model};
use crate::{ListArgs, ListObject, ListingFormat};

use die::die;

impl From<Vec<Model>> for Table {
    fn from(value: Vec<Model>) -> Self {
        let mut tab = Table::new();

        tab.set_header(vec!["MODEL", "NAME", "CONTEXT", "PROMPT", "COMPLETION"]);
        tab.right_align(2);

        for model in value {
            let (prompt, completion) = match model.pricing {
                Some(pricing) => (pricing.prompt, pricing.completion),
                None => ("unknown".to_string(), "unknown".to_string()),
            };

            tab.add_row(vec![
                model.id,
                model.name.unwrap_or_default(),
                match model.context_length {
                    Some(context) => context.to_string(),
                    None => "unknown".to_string(),
                },
                prompt,
                completion,
            ]);
        }

        tab
    }
}

async fn get_models<P: ChatProvider>(provider: &P) -> Vec<Model> {
    let mut models = match provider.models().await {
        Ok(models) => models,
        Err(err) => die!("failed to list models: {}", err.describe()),
    };

    models.sort_by(|a, b| a.id.cmp(&b.id));

    models
}

pub(crate) fn format_output<O: IntoTable + serde::Serialize>(object: O, format: ListingFormat) {
    match format {
        ListingFormat::Json => {
            let output = match serde_json::to_string_pretty(&object) {
                Ok(output) => output,
                Err(err) => die!("failed to serialize the listing: {}", err),
            };

            println!("{}", output);
        }
        ListingFormat::Table => {
            let tab = object.into_table();

            print!("{}", tab);
        }
        ListingFormat::HeaderlessTable => {
            let mut tab = object.into_table();

            tab.print_header(false);

            print!("{}", tab);
        }
    }
}

pub(crate) async fn list_cmd(config: &Config, args: &ListArgs) {
    let format = args.format;

    match &args.object {
        ListObject::Models => {
            let provider = provider_from_config(config);

            let models = get_models(&provider).await;

            format_output(models, format);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Pricing;

    #[test]
    fn test_model_table() {
        let models = vec![
            Model {
                id: "mistralai/mistral-7b-instruct".to_string(),
                name: Some("Mistral 7B Instruct".to_string()),
                context_length: Some(32768),
                pricing: Some(Pricing {
                    prompt: "0.00000006".to_string(),
                    completion: "0.00000006".to_string(),
                }),
            },
            Model {
                id: "local/tiny".to_string(),
                name: None,
                context_length: None,
                pricing: None,
            },
        ];

        let mut tab = models.into_table();
        tab.print_header(false);

        let output = tab.to_string();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(
            lines,
            vec![
                format!(
                    "{:<29}  {:<19}  {:>7}  {:<10}  {:<10}",
                    "mistralai/mistral-7b-instruct",
                    "Mistral 7B Instruct",
                    "32768",
                    "0.00000006",
                    "0.00000006"
                ),
                format!(
                    "{:<29}  {:<19}  {:>7}  {:<10}  {:<10}",
                    "local/tiny", "", "unknown", "unknown", "unknown"
                ),
            ]
        );
    }
}
