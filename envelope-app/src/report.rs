use envelope_core::model::{FamilyCategory, OpeningRole};
use envelope_core::units::from_internal_length;
use envelope_engine::MemoryHost;
use envelope_engine::pipeline::GenerationReport;

/// 以 JSON 格式输出生成报告。
pub fn print_json(report: &GenerationReport) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

/// 打印生成概览，坐标换算回毫米。
pub fn print_text(report: &GenerationReport, host: &MemoryHost) {
    println!("建筑外壳生成结果");
    println!(
        "轮廓: {:.0} mm x {:.0} mm",
        from_internal_length(report.footprint.width()),
        from_internal_length(report.footprint.depth())
    );

    println!("墙体：");
    for wall in &report.walls {
        let segment = &wall.segment;
        let role = match wall.role() {
            OpeningRole::DoorHost => "门",
            OpeningRole::WindowHost => "窗",
        };
        println!(
            "  - 墙 #{}, 起点=({:.0}, {:.0}), 终点=({:.0}, {:.0}), 长度={:.0}, 承载={}",
            wall.id,
            from_internal_length(segment.start.x()),
            from_internal_length(segment.start.y()),
            from_internal_length(segment.end.x()),
            from_internal_length(segment.end.y()),
            from_internal_length(segment.length()),
            role
        );
    }

    println!("洞口：");
    for opening in &report.openings {
        let placement = &opening.placement;
        let kind = match placement.category() {
            FamilyCategory::Door => "门",
            FamilyCategory::Window => "窗",
        };
        let point = placement.insertion_point;
        println!(
            "  - {kind} #{}, 宿主墙=#{}, 类型={}, 插入点=({:.1}, {:.1}, {:.1})",
            opening.instance,
            placement.host_wall,
            placement.selector.type_name,
            from_internal_length(point.x()),
            from_internal_length(point.y()),
            from_internal_length(point.z())
        );
    }

    if !report.failures.is_empty() {
        println!("未放置的洞口：");
        for failure in &report.failures {
            println!("  - 宿主墙=#{}: {}", failure.host_wall, failure.reason);
        }
    }

    println!(
        "已提交的原子单元: {}",
        host.committed_units().join(", ")
    );
}
