//! Optional tracking identifiers attached to runfolder records.

use crate::run_parameters::RunParameters;
use serde_json::Value;
use std::collections::BTreeMap;

pub const REAGENT_KIT_BARCODE: &str = "reagent_kit_barcode";
pub const LIBRARY_TUBE_BARCODE: &str = "library_tube_barcode";

const SAMPLE_TUBE_TYPE: &str = "SampleTube";

/// Extract the identifiers present in the run metadata. Never fails; a
/// missing field simply leaves its key out.
pub fn extract_metadata(run_parameters: Option<&RunParameters>) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    let Some(run_parameters) = run_parameters else {
        return metadata;
    };

    if let Some(barcode) = run_parameters.get_str(&["RunParameters", "ReagentKitBarcode"]) {
        metadata.insert(REAGENT_KIT_BARCODE.to_string(), barcode.to_string());
    }
    if let Some(barcode) = library_tube_barcode(run_parameters) {
        metadata.insert(LIBRARY_TUBE_BARCODE.to_string(), barcode.to_string());
    }
    metadata
}

fn library_tube_barcode(run_parameters: &RunParameters) -> Option<&str> {
    run_parameters
        .get_str(&["RunParameters", "RfidsInfo", "LibraryTubeSerialBarcode"])
        .or_else(|| sample_tube_serial_number(run_parameters))
}

/// NovaSeq X Plus lists consumables instead of RFID info.
fn sample_tube_serial_number(run_parameters: &RunParameters) -> Option<&str> {
    let consumables = run_parameters.get(&["RunParameters", "ConsumableInfo", "ConsumableInfo"])?;
    let entries = match consumables {
        Value::Array(items) => items.as_slice(),
        single @ Value::Object(_) => std::slice::from_ref(single),
        _ => return None,
    };
    entries
        .iter()
        .find(|entry| entry.get("Type").and_then(Value::as_str) == Some(SAMPLE_TUBE_TYPE))
        .and_then(|entry| entry.get("SerialNumber"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(tree: Value) -> RunParameters {
        RunParameters::from_value(json!({ "RunParameters": tree }))
    }

    #[test]
    fn test_no_run_parameters_is_empty() {
        assert!(extract_metadata(None).is_empty());
        assert!(extract_metadata(Some(&params(json!({})))).is_empty());
    }

    #[test]
    fn test_reagent_kit_barcode_only() {
        let metadata = extract_metadata(Some(&params(json!({ "ReagentKitBarcode": "ABC-123" }))));
        assert_eq!(metadata.get(REAGENT_KIT_BARCODE).map(String::as_str), Some("ABC-123"));
        assert!(!metadata.contains_key(LIBRARY_TUBE_BARCODE));
    }

    #[test]
    fn test_library_tube_from_rfids_info() {
        let metadata = extract_metadata(Some(&params(json!({
            "ReagentKitBarcode": "NV0012345-RGSBS",
            "RfidsInfo": { "LibraryTubeSerialBarcode": "NV0012345-LIB" },
        }))));
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata[LIBRARY_TUBE_BARCODE], "NV0012345-LIB");
    }

    #[test]
    fn test_library_tube_from_consumable_list() {
        let metadata = extract_metadata(Some(&params(json!({
            "ConsumableInfo": {
                "ConsumableInfo": [
                    { "Type": "FlowCell", "SerialNumber": "FC1" },
                    { "Type": "SampleTube", "SerialNumber": "LC1037822-LC1" },
                ]
            }
        }))));
        assert_eq!(metadata[LIBRARY_TUBE_BARCODE], "LC1037822-LC1");
        assert!(!metadata.contains_key(REAGENT_KIT_BARCODE));
    }

    #[test]
    fn test_library_tube_from_single_consumable() {
        let metadata = extract_metadata(Some(&params(json!({
            "ConsumableInfo": {
                "ConsumableInfo": { "Type": "SampleTube", "SerialNumber": "LC1" }
            }
        }))));
        assert_eq!(metadata[LIBRARY_TUBE_BARCODE], "LC1");
    }

    #[test]
    fn test_rfids_info_wins_over_consumables() {
        let metadata = extract_metadata(Some(&params(json!({
            "RfidsInfo": { "LibraryTubeSerialBarcode": "RFID" },
            "ConsumableInfo": {
                "ConsumableInfo": [{ "Type": "SampleTube", "SerialNumber": "CONSUMABLE" }]
            }
        }))));
        assert_eq!(metadata[LIBRARY_TUBE_BARCODE], "RFID");
    }

    #[test]
    fn test_no_sample_tube_is_absent() {
        let metadata = extract_metadata(Some(&params(json!({
            "ConsumableInfo": {
                "ConsumableInfo": [{ "Type": "Reagent", "SerialNumber": "R1" }]
            }
        }))));
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_extract_from_parsed_xml() {
        let parsed = RunParameters::parse(
            r#"<RunParameters>
                 <ConsumableInfo>
                   <ConsumableInfo><Type>SampleTube</Type><SerialNumber>LC1037822-LC1</SerialNumber></ConsumableInfo>
                 </ConsumableInfo>
               </RunParameters>"#,
        )
        .unwrap();
        let metadata = extract_metadata(Some(&parsed));
        assert_eq!(metadata[LIBRARY_TUBE_BARCODE], "LC1037822-LC1");
    }
}
