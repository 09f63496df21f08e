/// Mesh pipeline, its layout and the frame descriptor set layout

use lumen_engine::lumen::{
    Result,
    render::{PushConstants, Shader as _, Vertex},
};
use lumen_engine::{engine_err, engine_warn};
use ash::vk;

use crate::vulkan_format::buffer_format_to_vk;
use crate::vulkan_shader::Shader;

/// Set 0: binding 0 frame uniforms (vertex), binding 1 material texture (fragment)
pub(crate) fn create_frame_set_layout(device: &ash::Device) -> Result<vk::DescriptorSetLayout> {
    let bindings = [
        vk::DescriptorSetLayoutBinding::default()
            .binding(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::VERTEX),
        vk::DescriptorSetLayoutBinding::default()
            .binding(1)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::FRAGMENT),
    ];
    let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

    unsafe {
        device
            .create_descriptor_set_layout(&create_info, None)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create descriptor set layout: {:?}", e))
    }
}

/// Pipeline layout with the frame set and the per-draw push-constant range
pub(crate) fn create_pipeline_layout(
    device: &ash::Device,
    set_layout: vk::DescriptorSetLayout,
    vertex_shader: &Shader,
) -> Result<vk::PipelineLayout> {
    let declared = vertex_shader.push_constant_size();
    if declared != 0 && declared != PushConstants::SIZE {
        engine_warn!(
            "lumen::vulkan",
            "Vertex shader declares a {} byte push-constant block, renderer pushes {} bytes",
            declared,
            PushConstants::SIZE
        );
    }

    let push_constant_ranges = [vk::PushConstantRange {
        stage_flags: vk::ShaderStageFlags::VERTEX,
        offset: 0,
        size: PushConstants::SIZE,
    }];
    let set_layouts = [set_layout];
    let create_info = vk::PipelineLayoutCreateInfo::default()
        .set_layouts(&set_layouts)
        .push_constant_ranges(&push_constant_ranges);

    unsafe {
        device
            .create_pipeline_layout(&create_info, None)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create pipeline layout: {:?}", e))
    }
}

/// Graphics pipeline for textured meshes
///
/// Triangle list, back-face culling with counter-clockwise front faces,
/// depth test LESS with writes, no blending, viewport and scissor baked
/// for `extent`.
pub(crate) fn create_mesh_pipeline(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    layout: vk::PipelineLayout,
    extent: vk::Extent2D,
    vertex_shader: &Shader,
    fragment_shader: &Shader,
) -> Result<vk::Pipeline> {
    let shader_stages = [
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vertex_shader.stage_flags())
            .module(vertex_shader.module)
            .name(&vertex_shader.entry_point),
        vk::PipelineShaderStageCreateInfo::default()
            .stage(fragment_shader.stage_flags())
            .module(fragment_shader.module)
            .name(&fragment_shader.entry_point),
    ];

    let vertex_bindings = [vk::VertexInputBindingDescription {
        binding: 0,
        stride: Vertex::STRIDE,
        input_rate: vk::VertexInputRate::VERTEX,
    }];
    let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = Vertex::attributes()
        .iter()
        .map(|attribute| vk::VertexInputAttributeDescription {
            location: attribute.location,
            binding: 0,
            format: buffer_format_to_vk(attribute.format),
            offset: attribute.offset,
        })
        .collect();

    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
        .vertex_binding_descriptions(&vertex_bindings)
        .vertex_attribute_descriptions(&vertex_attributes);

    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
        .primitive_restart_enable(false);

    let viewports = [vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }];
    let scissors = [vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }];
    let viewport_state = vk::PipelineViewportStateCreateInfo::default()
        .viewports(&viewports)
        .scissors(&scissors);

    let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .depth_bias_enable(false);

    let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
        .depth_test_enable(true)
        .depth_write_enable(true)
        .depth_compare_op(vk::CompareOp::LESS)
        .depth_bounds_test_enable(false)
        .stencil_test_enable(false);

    let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
        .sample_shading_enable(false)
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
        .color_write_mask(vk::ColorComponentFlags::RGBA)
        .blend_enable(false);
    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
        .logic_op_enable(false)
        .attachments(std::slice::from_ref(&color_blend_attachment));

    let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&shader_stages)
        .vertex_input_state(&vertex_input_state)
        .input_assembly_state(&input_assembly_state)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization_state)
        .depth_stencil_state(&depth_stencil_state)
        .multisample_state(&multisample_state)
        .color_blend_state(&color_blend_state)
        .layout(layout)
        .render_pass(render_pass)
        .subpass(0);

    let pipelines = unsafe {
        device
            .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create graphics pipeline: {:?}", e.1))?
    };

    pipelines
        .into_iter()
        .next()
        .ok_or_else(|| engine_err!("lumen::vulkan", "Driver returned no graphics pipeline"))
}
