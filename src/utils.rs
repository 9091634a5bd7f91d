use js_sys::Reflect;
use wasm_bindgen::JsValue;

pub fn get_attribute<T>(
    object: &JsValue,
    field_name: &str,
    mapper: impl Fn(&JsValue) -> Option<T>,
) -> Result<Option<T>, JsValue> {
    Reflect::get(object, &JsValue::from_str(field_name)).map(|x| mapper(&x))
}

/// RAM is tracked in hundredths of a GB so capacity arithmetic stays exact.
pub fn gb_to_hundredths(gb: f64) -> u64 {
    (gb * 100.).round().max(0.) as u64
}

// absorbs float noise such as 5.250000000000001 before ceil/floor
const HUNDREDTHS_EPSILON: f64 = 1e-6;

/// Rounds up. Used for RAM that is already taken.
pub fn gb_to_hundredths_ceil(gb: f64) -> u64 {
    (gb * 100. - HUNDREDTHS_EPSILON).ceil().max(0.) as u64
}

/// Rounds down. Used for RAM a node can hand out.
pub fn gb_to_hundredths_floor(gb: f64) -> u64 {
    (gb * 100. + HUNDREDTHS_EPSILON).floor().max(0.) as u64
}
