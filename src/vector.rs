//! 関節角度の計算に使う3次元ベクトル演算

use nalgebra::Vector3;

use crate::error::DegenerateVectorError;

pub type Vec3 = Vector3<f64>;

/// a から b へのベクトル (b - a)
pub fn vector_between(a: &Vec3, b: &Vec3) -> Vec3 {
    b - a
}

pub fn magnitude(v: &Vec3) -> f64 {
    v.norm()
}

pub fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a.dot(b)
}

/// 2ベクトルのなす角（度）
///
/// cos の引数は浮動小数点誤差で [-1, 1] をわずかに超えることがあるため
/// acos の前に必ずクランプする。どちらかがゼロ長なら角度は定義できない。
pub fn angle_between(a: &Vec3, b: &Vec3) -> Result<f64, DegenerateVectorError> {
    // 最大成分で正規化してから2乗する（極小・極大ベクトルでのアンダーフロー/オーバーフロー対策）
    let a = normalized_by_max(a)?;
    let b = normalized_by_max(b)?;
    // |a||b| = sqrt(|a|^2 |b|^2); a == b のとき分母と内積が厳密に一致する
    let denominator = (dot(&a, &a) * dot(&b, &b)).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(DegenerateVectorError);
    }
    let cos = (dot(&a, &b) / denominator).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// 最大絶対値成分が 1 になるよう縮尺した向きだけのベクトル
fn normalized_by_max(v: &Vec3) -> Result<Vec3, DegenerateVectorError> {
    let scale = v.amax();
    if scale == 0.0 || !scale.is_finite() {
        return Err(DegenerateVectorError);
    }
    Ok(v / scale)
}

/// 2点間の距離。診断用でありクラス分類には使わない
pub fn euclidean_distance(a: &Vec3, b: &Vec3) -> f64 {
    magnitude(&vector_between(a, b))
}
