//! Low-level NetCDF extraction helpers.

use std::path::Path;

use netcdf::AttributeValue;

use crate::error::IoError;

/// Magnitude from which values are treated as netCDF default fill.
const DEFAULT_FILL_THRESHOLD: f64 = 9.9e36;

/// Attributes whose values mark missing data.
const FILL_ATTRIBUTES: [&str; 2] = ["_FillValue", "missing_value"];

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

/// Look up a variable, trying each alias in order.
///
/// If none match, returns [`IoError::MissingVariable`] with the first alias
/// as the name.
pub(crate) fn find_variable<'f>(
    file: &'f netcdf::File,
    aliases: &[&str],
    path: &Path,
) -> Result<netcdf::Variable<'f>, IoError> {
    for &alias in aliases {
        if let Some(var) = file.variable(alias) {
            return Ok(var);
        }
    }

    let name = aliases.first().copied().unwrap_or("unknown");
    Err(IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read a 1-D `f64` variable, trying each alias in order.
pub(crate) fn read_1d_f64(
    file: &netcdf::File,
    aliases: &[&str],
    path: &Path,
) -> Result<Vec<f64>, IoError> {
    let var = find_variable(file, aliases, path)?;
    Ok(var.get_values::<f64, _>(..)?)
}

/// Read every value of `var` as `f64`, with fill and missing values
/// replaced by `NaN`.
pub(crate) fn read_masked(var: &netcdf::Variable<'_>) -> Result<Vec<f64>, IoError> {
    let fills = fill_values(var);
    let mut data = var.get_values::<f64, _>(..)?;
    for v in &mut data {
        if fills.contains(v) || v.abs() >= DEFAULT_FILL_THRESHOLD {
            *v = f64::NAN;
        }
    }
    Ok(data)
}

/// Lengths of the variable's dimensions, outermost first.
pub(crate) fn shape(var: &netcdf::Variable<'_>) -> Vec<usize> {
    var.dimensions().iter().map(|d| d.len()).collect()
}

/// Numeric values of the `_FillValue` and `missing_value` attributes.
fn fill_values(var: &netcdf::Variable<'_>) -> Vec<f64> {
    FILL_ATTRIBUTES
        .iter()
        .filter_map(|name| var.attribute_value(name).and_then(Result::ok))
        .flat_map(numeric_values)
        .collect()
}

fn numeric_values(value: AttributeValue) -> Vec<f64> {
    match value {
        AttributeValue::Double(x) => vec![x],
        AttributeValue::Doubles(xs) => xs,
        AttributeValue::Float(x) => vec![f64::from(x)],
        AttributeValue::Floats(xs) => xs.into_iter().map(f64::from).collect(),
        AttributeValue::Int(x) => vec![f64::from(x)],
        AttributeValue::Ints(xs) => xs.into_iter().map(f64::from).collect(),
        AttributeValue::Short(x) => vec![f64::from(x)],
        AttributeValue::Shorts(xs) => xs.into_iter().map(f64::from).collect(),
        AttributeValue::Longlong(x) => vec![x as f64],
        AttributeValue::Longlongs(xs) => xs.into_iter().map(|x| x as f64).collect(),
        _ => Vec::new(),
    }
}

/// A string attribute, or `None` if absent or not a string.
pub(crate) fn string_attr(var: &netcdf::Variable<'_>, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Read the time axis: raw offsets, the `units` attribute and the optional
/// `calendar` attribute.
pub(crate) fn read_time(
    file: &netcdf::File,
    time_var: &str,
    path: &Path,
) -> Result<(Vec<f64>, String, Option<String>), IoError> {
    let var = find_variable(file, &[time_var], path)?;
    let units = string_attr(&var, "units").ok_or_else(|| IoError::InvalidTime {
        reason: format!("time variable '{time_var}' has no string 'units' attribute"),
    })?;
    let calendar = string_attr(&var, "calendar");
    let values = var.get_values::<f64, _>(..)?;
    Ok((values, units, calendar))
}
