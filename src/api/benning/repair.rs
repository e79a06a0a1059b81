use itertools::Itertools;

/// Turn the near-JSON body of `getentries.cgi` into valid JSON.
///
/// The firmware embeds raw line breaks into the array and emits stray and trailing commas.
/// The steps must be applied in this order to match what the device actually sends.
pub fn repair(body: &str) -> String {
    let body = body.replace('\n', "").replace('\r', "");
    let repaired = body.split(',').filter(|fragment| !fragment.is_empty()).join(",");
    if repaired.ends_with(",]") { repaired.replace(",]", "]") } else { repaired }
}
