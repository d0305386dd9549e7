use std::cmp::Ordering;

use crate::{Error, RasterNum, Result, raster::DenseRaster};

fn to_f64<T: RasterNum>(value: T) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| Error::InvalidArgument(format!("Failed to convert raster value to f64: '{value:?}'")))
}

/// Computes the quantiles of already sorted data using linear interpolation between the closest ranks.
pub(crate) fn array_quantiles<T: RasterNum>(data: &[T], quantile_vals: &[f64]) -> Result<Option<Vec<f64>>> {
    if data.is_empty() {
        return Ok(None);
    }

    let mut results = Vec::with_capacity(quantile_vals.len());
    let len = data.len() as f64;

    for &q in quantile_vals {
        let pos = q * (len - 1.0);
        let lower = pos.floor() as usize;
        let upper = pos.ceil() as usize;

        let value = if lower == upper {
            to_f64(data[lower])?
        } else {
            let lower_val = to_f64(data[lower])?;
            let upper_val = to_f64(data[upper])?;
            let weight = pos - lower as f64;
            lower_val * (1.0 - weight) + upper_val * weight
        };

        results.push(value);
    }

    Ok(Some(results))
}

fn sorted_quantiles<T: RasterNum>(mut data: Vec<T>, quantile_vals: &[f64]) -> Result<Option<Vec<f64>>> {
    if quantile_vals.iter().any(|&q| !(0.0..=1.0).contains(&q)) {
        return Err(Error::InvalidArgument("Quantile values must be between 0 and 1".to_string()));
    }

    data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    array_quantiles(&data, quantile_vals)
}

/// Computes the quantiles (in the range [0, 1]) of the raster values, ignoring nodata values.
/// Returns `None` if the raster contains no data.
pub fn quantiles<T: RasterNum>(ras: &DenseRaster<T>, quantile_vals: &[f64]) -> Result<Option<Vec<f64>>> {
    sorted_quantiles(ras.iter_values().collect(), quantile_vals)
}

/// Computes the quantiles of the values of the cells selected by the mask, ignoring nodata values.
/// Returns `None` if none of the selected cells contain data.
pub fn quantiles_masked<T: RasterNum>(ras: &DenseRaster<T>, mask: &[bool], quantile_vals: &[f64]) -> Result<Option<Vec<f64>>> {
    super::check_mask(ras, mask)?;
    sorted_quantiles(super::masked_values(ras, mask).collect(), quantile_vals)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        raster::algo,
        testutils::{NOD, create_vec, test_georef},
    };

    #[test]
    fn quantiles_all_nodata() -> Result<()> {
        #[rustfmt::skip]
        let raster = DenseRaster::<f64>::new(test_georef(3, 2), create_vec(&[
            NOD, NOD,
            NOD, NOD,
            NOD, NOD,
        ]))?;

        assert!(algo::quantiles(&raster, &[0.0, 0.25, 0.5, 0.75, 1.0])?.is_none());

        Ok(())
    }

    #[test]
    fn quantiles() -> Result<()> {
        {
            #[rustfmt::skip]
            let raster = DenseRaster::<f64>::new(test_georef(3, 2), create_vec(&[
                3.0, 1.0,
                4.0, NOD,
                1.0, 2.0,
            ]))?;

            let quants = algo::quantiles(&raster, &[0.0, 0.25, 0.5, 0.75, 1.0])?.expect("Quantiles should have a value");
            assert_eq!(quants, vec![1.0, 1.0, 2.0, 3.0, 4.0]);
        }

        {
            #[rustfmt::skip]
            let raster = DenseRaster::<f64>::new(test_georef(3, 2), create_vec(&[
                3.0, 1.0,
                4.0, 7.0,
                1.0, 2.0,
            ]))?;

            let quants = algo::quantiles(&raster, &[0.0, 0.25, 0.5, 0.75, 1.0])?.expect("Quantiles should have a value");
            assert_eq!(quants, vec![1.0, 1.25, 2.5, 3.75, 7.0]);
        }

        Ok(())
    }

    #[test]
    fn quantiles_within_mask() -> Result<()> {
        #[rustfmt::skip]
        let raster = DenseRaster::<f64>::new(test_georef(2, 3), create_vec(&[
            10.0, 20.0, 30.0,
            40.0, 50.0, 1000.0,
        ]))?;

        #[rustfmt::skip]
        let mask = [
            true, true, true,
            true, true, false,
        ];

        let quants = algo::quantiles_masked(&raster, &mask, &[0.2, 0.4, 0.6, 0.8])?.expect("Quantiles should have a value");
        for (actual, expected) in quants.iter().zip([18.0, 26.0, 34.0, 42.0]) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-9);
        }

        Ok(())
    }

    #[test]
    fn quantiles_out_of_range() -> Result<()> {
        let raster = DenseRaster::<f64>::new(test_georef(1, 2), vec![1.0, 2.0])?;
        assert!(algo::quantiles(&raster, &[1.5]).is_err());

        Ok(())
    }
}
