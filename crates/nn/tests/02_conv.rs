use nn::{Conv2d, MaxPool2d};
use tensor::Tensor;

#[test]
fn conv_identity_kernel_preserves_input() {
    // 3x3 kernel with only the center tap set reproduces the input exactly
    // under same-padding.
    let w = vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    let conv = Conv2d::new(w, vec![0.0], 1, 1, 3);
    let x = Tensor::from_vec(
        vec![1, 1, 3, 3],
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
    );
    let y = conv.forward(&x).unwrap();
    assert_eq!(y.shape(), &[1, 1, 3, 3]);
    assert_eq!(y.data(), x.data());
}

#[test]
fn conv_sums_respect_zero_padding() {
    // All-ones kernel over an all-ones 3x3 plane counts in-bounds taps:
    // 4 at corners, 6 at edges, 9 at the center.
    let conv = Conv2d::new(vec![1.0; 9], vec![0.0], 1, 1, 3);
    let x = Tensor::from_vec(vec![1, 1, 3, 3], vec![1.0; 9]);
    let y = conv.forward(&x).unwrap();
    assert_eq!(
        y.data(),
        &[4.0, 6.0, 4.0, 6.0, 9.0, 6.0, 4.0, 6.0, 4.0]
    );
}

#[test]
fn conv_rejects_wrong_channel_count() {
    let conv = Conv2d::random(2, 4, 3);
    let x = Tensor::zeros(vec![1, 3, 8, 8]);
    assert!(conv.forward(&x).is_err());
}

#[test]
fn max_pool_values() {
    let pool = MaxPool2d::new(2, 2);
    let x = Tensor::from_vec(
        vec![1, 1, 4, 4],
        vec![
            1.0, 2.0, 5.0, 6.0, //
            3.0, 4.0, 7.0, 8.0, //
            -1.0, 0.0, 9.0, 1.0, //
            2.0, 1.0, 0.0, 3.0,
        ],
    );
    let y = pool.forward(&x).unwrap();
    assert_eq!(y.shape(), &[1, 1, 2, 2]);
    assert_eq!(y.data(), &[4.0, 8.0, 2.0, 9.0]);
}

#[test]
fn pool_chain_spatial_arithmetic() {
    // 65 -> 31 -> 6, the reduction the backbone relies on.
    let pool1 = MaxPool2d::new(5, 2);
    let pool2 = MaxPool2d::new(5, 5);
    assert_eq!(pool1.out_len(65), Some(31));
    assert_eq!(pool2.out_len(31), Some(6));
    assert_eq!(pool2.out_len(4), None);

    let x = Tensor::zeros(vec![1, 1, 65, 65]);
    let y = pool1.forward(&x).unwrap();
    assert_eq!(y.shape(), &[1, 1, 31, 31]);
    let z = pool2.forward(&y).unwrap();
    assert_eq!(z.shape(), &[1, 1, 6, 6]);
}
