use super::*;

#[test]
fn frame_pixel_is_bounds_checked() {
    let f = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        premultiplied: true,
    };
    assert_eq!(f.pixel(1, 0), Some([5, 6, 7, 8]));
    assert_eq!(f.pixel(2, 0), None);
    assert_eq!(f.digest(), f.clone().digest());
}

#[test]
fn unpremultiply_restores_straight_channels() {
    let mut f = FrameRGBA {
        width: 3,
        height: 1,
        data: vec![64, 32, 0, 128, 9, 9, 9, 0, 10, 20, 30, 255],
        premultiplied: true,
    };
    f.unpremultiply();
    assert!(!f.premultiplied);
    assert_eq!(f.pixel(0, 0), Some([128, 64, 0, 128]));
    assert_eq!(f.pixel(1, 0), Some([0, 0, 0, 0]));
    assert_eq!(f.pixel(2, 0), Some([10, 20, 30, 255]));

    let before = f.data.clone();
    f.unpremultiply();
    assert_eq!(f.data, before);
}

#[test]
fn cpu_backend_kind_creates_working_backend() {
    let mut gpu = create_backend(BackendKind::Cpu, CpuBackendOpts::default());
    gpu.init(8, 8).unwrap();
    assert!(gpu.supports_batching());
    assert_eq!(gpu.max_texture_units(), 16);
    assert_eq!(gpu.target_size(), (8, 8));
}

#[test]
fn nested_with_target_unwinds_in_order() {
    let mut gpu = create_backend(BackendKind::Cpu, CpuBackendOpts::default());
    gpu.init(4, 4).unwrap();
    let a = gpu.create_texture(2, 2, None).unwrap();
    let b = gpu.create_texture(1, 1, None).unwrap();
    with_target(gpu.as_mut(), Target::Texture(a), |gpu| {
        assert_eq!(gpu.target_size(), (2, 2));
        with_target(gpu, Target::Texture(b), |gpu| {
            assert_eq!(gpu.target_size(), (1, 1));
            Ok(())
        })?;
        assert_eq!(gpu.target_size(), (2, 2));
        Ok(())
    })
    .unwrap();
    assert_eq!(gpu.target_size(), (4, 4));
}
