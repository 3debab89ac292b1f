use reference_data::search::RESERVED_FIELD;
use reference_data::IndexSchema;

/// Assemble the system instruction: grammar, searchable fields, species
/// vocabulary and the standing rules for writing queries.
pub fn build_system_prompt(grammar: &str, index_schema: &IndexSchema, species: &[String]) -> String {
    let fields: IndexSchema = index_schema
        .iter()
        .filter(|(name, _)| name.as_str() != RESERVED_FIELD)
        .map(|(name, descriptor)| (name.clone(), descriptor.clone()))
        .collect();
    let fields = serde_json::to_string_pretty(&fields).unwrap_or_default();
    let species = serde_json::to_string(species).unwrap_or_default();

    format!(
        r#"You will be given a custom ANTLR grammar file which is used to query veterinary patient records.
Use it to generate a structured search string that follows the rules of the custom grammar, based on the provided prompt.

Custom grammar description:
{grammar}

The following search index mapping lists the fields that can be searched using the custom grammar:
{fields}

The following list includes all possible values for the species field:
{species}

Make sure to convert any common names (dog, cat, etc.) to their correct species (Canine, Feline) based on the provided list.
Never query the species field with the breed of an animal, and never query the breed field with a species.
When searching for specific conditions or procedures, the case notes fields will most likely contain the relevant information.

Syntax notes:
* Nested fields cannot be accessed directly with dotted paths like cases.assessment.notes
* Searching a nested field requires a new bracket for each level, like: cases{{assessment{{notes}}}}
"#
    )
}

/// The instruction carrying the caller's free-text request.
pub fn build_user_prompt(prompt: &str) -> String {
    format!("Generate a custom grammar query based on the following prompt:\n{prompt}")
}
