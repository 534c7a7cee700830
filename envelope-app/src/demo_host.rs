use envelope_config::HostConfig;
use envelope_core::units::to_internal_length;
use envelope_engine::MemoryHost;
use tracing::debug;

/// 按配置构造内存宿主文档：标高与族目录均按配置顺序登记。
pub fn build(config: &HostConfig) -> MemoryHost {
    let mut host = MemoryHost::new()
        .with_wall_thickness(to_internal_length(config.wall_thickness_mm))
        .with_joined_ends(config.joined_ends);
    for level in &config.levels {
        let id = host.add_level(level.name.clone(), to_internal_length(level.elevation_mm));
        debug!(name = %level.name, id = id.get(), "已登记标高");
    }
    for entry in &config.catalog {
        let id = host.add_family_type(entry.selector());
        debug!(selector = %entry.selector(), id = id.get(), "已登记族类型");
    }
    host
}
