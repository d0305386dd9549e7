use crate::Nodata;

/// Type requirements for the cell values of a raster
pub trait RasterNum:
    Copy + Nodata + num::Num + num::NumCast + num::Bounded + PartialOrd + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static
{
    /// Converts the value to f64, nodata values map to `None`
    #[inline]
    fn to_f64_opt(self) -> Option<f64> {
        if self.is_nodata() { None } else { self.to_f64() }
    }
}

macro_rules! rasternum_impl {
    ($($t:ty),*) => {
        $(impl RasterNum for $t {})*
    };
}

rasternum_impl!(u8, u16, u32, i16, i32, i64, f32, f64);
